/*!
This crate implements the executor for two-party payment channels.

Two parties lock funds in a channel's escrow, exchange signed balance proofs off-chain, and come
back on-chain only to deposit, withdraw, dispute, or settle. The executor enforces the channel
lifecycle:

```text
Open --deposit/withdraw/update-proof--> Open --close--> Closed --settle--> Settled
```

The host hands the executor one [`Action`] at a time together with an [`ExecContext`]. The action
is validated ([`Executor::check`]) and then executed ([`Executor::exec`]) against the host's
key/value state. Execution returns a [`Receipt`] holding the state writes and the event log; the
host commits the writes only if it accepts the receipt.

Proofs are signed with the keys in `paychan-crypto`. The signer of a proof is never taken from a
field of the proof: it is recovered from a verified signature.
*/
#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod action;
pub mod config;
pub mod events;
pub mod ledger;
pub mod proofs;
pub mod query;
pub mod registry;
pub mod store;

mod context;
mod error;
mod nonce;
mod processor;
#[cfg(feature = "sqlite")]
mod sqlite;
mod states;
mod validate;

pub use action::Action;
pub use config::Config;
pub use context::ExecContext;
pub use error::{Error, ErrorKind, Result};
pub use events::{Event, Receipt};
pub use ledger::{AssetLedger, ExecAccounts};
pub use nonce::Nonce;
pub use processor::Executor;
pub use proofs::{BalanceProof, CanonicalAsset, ProofCodec, WithdrawProof};
pub use query::{Query, QueryResponse};
pub use states::{AssetId, Channel, ChannelId, ChannelState, Participant};
pub use store::{KvStore, MemoryStore, StateBatch, StateRead, StoreError};
pub use validate::CheckedAction;
