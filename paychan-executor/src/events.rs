//! Event logs and receipts produced by executed actions.

use crate::{
    store::{KeyValue, KvStore},
    AssetId, ChannelId, Nonce, Result,
};
use paychan_crypto::Address;
use serde::*;

/// An entry in an action's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A channel was opened.
    Open {
        /// The opener.
        opener: Address,
        /// The opener's partner.
        partner: Address,
        /// The new channel's id.
        channel_id: ChannelId,
        /// Amount deposited by the opener at open.
        initial_balance: u64,
        /// Chain the channel lives on.
        chain: String,
        /// Escrowed asset.
        asset: AssetId,
        /// The settle timeout after clamping.
        settle_timeout: u64,
    },
    /// A participant raised their cumulative deposit.
    Deposit {
        /// Chain the channel lives on.
        chain: String,
        /// Escrowed asset.
        asset: AssetId,
        /// The channel deposited into.
        channel_id: ChannelId,
        /// The depositing participant.
        depositor: Address,
        /// The other participant.
        partner: Address,
        /// The depositor's new cumulative deposit.
        total_deposit: u64,
    },
    /// A participant withdrew with the counterparty's authorization.
    Withdraw {
        /// The channel withdrawn from.
        channel_id: ChannelId,
        /// The withdrawing participant.
        withdrawer: Address,
        /// The authorizing counterparty.
        partner: Address,
        /// The withdrawer's new cumulative withdrawal.
        total_withdraw: u64,
    },
    /// A participant closed the channel.
    Close {
        /// Chain the channel lives on.
        chain: String,
        /// Escrowed asset.
        asset: AssetId,
        /// The closed channel.
        channel_id: ChannelId,
        /// The closing participant.
        closer: Address,
        /// The other participant, whose balance proof was submitted.
        partner: Address,
    },
    /// A participant submitted the counterparty's balance proof.
    UpdateProof {
        /// Chain the channel lives on.
        chain: String,
        /// Escrowed asset.
        asset: AssetId,
        /// The updated channel.
        channel_id: ChannelId,
        /// The submitting participant.
        updater: Address,
        /// The participant who signed the proof.
        partner: Address,
        /// Nonce carried by the proof.
        nonce: Nonce,
        /// Whether the proof superseded the recorded one.
        applied: bool,
    },
    /// The channel was settled and the escrow paid out.
    Settle {
        /// Chain the channel lives on.
        chain: String,
        /// Escrowed asset.
        asset: AssetId,
        /// The settled channel.
        channel_id: ChannelId,
        /// The settling caller's partner.
        participant1: Address,
        /// Amount the partner was declared to have transferred.
        transferred_amount1: u64,
        /// The settling caller.
        participant2: Address,
        /// Amount the caller declared to have transferred.
        transferred_amount2: u64,
    },
    /// Funds moved between accounts inside an asset namespace.
    Transfer {
        /// The moved asset.
        asset: AssetId,
        /// Namespace the accounts live in.
        namespace: Address,
        /// Paying account.
        from: Address,
        /// Receiving account.
        to: Address,
        /// Amount moved.
        amount: u64,
        /// Paying account's balance afterwards.
        from_balance: u64,
        /// Receiving account's balance afterwards.
        to_balance: u64,
    },
}

impl Event {
    /// Numeric log type.
    pub fn log_type(&self) -> u32 {
        match self {
            Event::Open { .. } => 1001,
            Event::Deposit { .. } => 1002,
            Event::Withdraw { .. } => 1003,
            Event::Close { .. } => 1004,
            Event::UpdateProof { .. } => 1005,
            Event::Settle { .. } => 1006,
            Event::Transfer { .. } => 1100,
        }
    }

    /// Log name.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Open { .. } => "LogChannelOpen",
            Event::Deposit { .. } => "LogChannelDeposit",
            Event::Withdraw { .. } => "LogChannelWithdraw",
            Event::Close { .. } => "LogChannelClose",
            Event::UpdateProof { .. } => "LogChannelUpdateProof",
            Event::Settle { .. } => "LogChannelSettle",
            Event::Transfer { .. } => "LogAssetTransfer",
        }
    }
}

/// The outcome of a successful action: state writes to commit, and the event log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Receipt {
    /// Writes to apply, in order.
    pub writes: Vec<KeyValue>,
    /// Event log describing the effect.
    pub events: Vec<Event>,
}

impl Receipt {
    /// Apply the writes to `store`.
    pub fn commit<S: KvStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        for kv in &self.writes {
            store.put(kv.key.clone(), kv.value.clone())?;
        }
        Ok(())
    }

    /// Channel events, without the ledger's transfer events.
    pub fn channel_events(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| !matches!(e, Event::Transfer { .. }))
    }

    /// Transfer events.
    pub fn transfers(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Transfer { .. }))
    }
}
