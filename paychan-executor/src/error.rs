//! Error types for the channel executor.
//!
//! Every failure aborts the action it belongs to with no persisted effect. [`Error::kind`] sorts
//! each error into the coarse [`ErrorKind`] taxonomy that callers use to decide what to report.

use paychan_crypto::Address;
use thiserror::Error;

use crate::states::{ChannelId, ChannelState};
use crate::store::StoreError;

/// The main error type for the channel executor.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The action payload is missing fields or carries malformed values.
    #[error("invalid action parameter: {0}")]
    InvalidParam(&'static str),

    /// The action payload could not be decoded.
    #[error("undecodable action payload: {0}")]
    UndecodableAction(#[source] bincode::Error),

    /// The named addresses are not exactly the channel's two distinct participants.
    #[error("invalid channel participants: {first} and {second}")]
    InvalidParticipants {
        /// The acting party.
        first: Address,
        /// The counterparty.
        second: Address,
    },

    /// The transaction signer is not a participant of the channel.
    #[error("{address} is not a participant of channel {channel_id}")]
    NotParticipant {
        /// The channel acted on.
        channel_id: ChannelId,
        /// The acting address.
        address: Address,
    },

    /// The action is not allowed in the channel's current phase.
    #[error("channel {channel_id} is {state:?}, expected {expected:?}")]
    ChannelState {
        /// The channel acted on.
        channel_id: ChannelId,
        /// Its current state.
        state: ChannelState,
        /// The state the action requires.
        expected: ChannelState,
    },

    /// A deposit did not raise the participant's cumulative deposit.
    #[error("total deposit {requested} does not exceed current total deposit {current}")]
    TotalDepositAmount {
        /// Requested cumulative deposit.
        requested: u64,
        /// Cumulative deposit already recorded.
        current: u64,
    },

    /// A withdrawal is non-positive or exceeds the channel's escrowed funds.
    #[error("invalid withdraw amount: total withdraw {total_withdraw} against recorded {recorded}, escrow holds {available}")]
    InvalidWithdrawAmount {
        /// Cumulative withdrawal authorized by the proof.
        total_withdraw: u64,
        /// Cumulative withdrawal already recorded.
        recorded: u64,
        /// Funds currently escrowed for the channel.
        available: u64,
    },

    /// Settling with the declared transferred amounts would pay someone a negative amount.
    #[error("invalid transferred amounts: settle amounts {self_settle} and {partner_settle}")]
    InvalidTransferredAmount {
        /// Computed payout to the caller.
        self_settle: i128,
        /// Computed payout to the partner.
        partner_settle: i128,
    },

    /// The asset ledger could not cover a transfer.
    #[error("insufficient balance: {address} holds {available}, needs {needed}")]
    InsufficientBalance {
        /// The paying account.
        address: Address,
        /// Its balance.
        available: u64,
        /// The amount requested.
        needed: u64,
    },

    /// A cumulative amount or balance would overflow.
    #[error("amount overflow")]
    AmountOverflow,

    /// A proof signature failed to verify.
    #[error("partner signature rejected: {0}")]
    PartnerSign(#[from] paychan_crypto::Error),

    /// The transaction signer is not the withdrawer named in the withdraw proof.
    #[error("withdraw proof names {withdrawer}, transaction signed by {signer}")]
    WithdrawSign {
        /// Withdrawer named in the proof.
        withdrawer: Address,
        /// Actual transaction signer.
        signer: Address,
    },

    /// The withdraw proof expired.
    #[error("withdraw proof expired at block {expiration}, current height {height}")]
    WithdrawBlockExpiration {
        /// Expiration height of the proof.
        expiration: u64,
        /// Current height.
        height: u64,
    },

    /// Settle was attempted before the challenge period elapsed.
    #[error("channel {channel_id} is in its challenge period until height {settle_height}, current height {height}")]
    ChannelCloseChallengePeriod {
        /// The channel acted on.
        channel_id: ChannelId,
        /// Height at which settlement unlocks.
        settle_height: u64,
        /// Current height.
        height: u64,
    },

    /// The challenge period would end past the largest representable height.
    #[error("channel {channel_id} cannot close at height {height}: settle height overflows")]
    SettleHeightOverflow {
        /// The channel acted on.
        channel_id: ChannelId,
        /// Current height.
        height: u64,
    },

    /// A proof is bound to a different channel, chain or asset than the one it is used with.
    #[error("channel info does not match: {0}")]
    ChannelInfoNotMatch(&'static str),

    /// The channel id counter is exhausted.
    #[error("channel id counter overflow")]
    ChannelIdOverflow,

    /// No channel is stored under this id.
    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A persisted value could not be encoded or decoded.
    #[error("state codec: {0}")]
    Codec(#[source] bincode::Error),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing fields, rejected before execution.
    Structural,
    /// Signer or counterparty is not one of the two registered participants.
    Participant,
    /// Action invalid for the current phase.
    State,
    /// Non-positive or out-of-range amounts, insufficient funds.
    Amount,
    /// A proof failed to verify or came from the wrong party.
    Signature,
    /// Expired withdraw proof or settle inside the challenge period.
    Timeout,
    /// Embedded channel id, chain or asset does not match.
    Consistency,
    /// The channel id counter is exhausted. Fatal and not retryable.
    Overflow,
    /// The requested channel does not exist.
    NotFound,
    /// Persistence or codec failure.
    Storage,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParam(_) | Error::UndecodableAction(_) | Error::InvalidConfig(_) => {
                ErrorKind::Structural
            }
            Error::InvalidParticipants { .. } | Error::NotParticipant { .. } => {
                ErrorKind::Participant
            }
            Error::ChannelState { .. } => ErrorKind::State,
            Error::TotalDepositAmount { .. }
            | Error::InvalidWithdrawAmount { .. }
            | Error::InvalidTransferredAmount { .. }
            | Error::InsufficientBalance { .. }
            | Error::AmountOverflow => ErrorKind::Amount,
            Error::PartnerSign(_) | Error::WithdrawSign { .. } => ErrorKind::Signature,
            Error::WithdrawBlockExpiration { .. }
            | Error::ChannelCloseChallengePeriod { .. }
            | Error::SettleHeightOverflow { .. } => ErrorKind::Timeout,
            Error::ChannelInfoNotMatch(_) => ErrorKind::Consistency,
            Error::ChannelIdOverflow => ErrorKind::Overflow,
            Error::ChannelNotFound(_) => ErrorKind::NotFound,
            Error::Codec(_) | Error::Store(_) => ErrorKind::Storage,
        }
    }

    /// Whether resubmitting the same action could ever succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Overflow)
    }
}

/// Result type alias for the executor.
pub type Result<T> = std::result::Result<T, Error>;
