//! Action payloads, as submitted in transactions.

use crate::{
    proofs::{BalanceProof, WithdrawProof},
    AssetId, ChannelId, Error, Result,
};
use paychan_crypto::{Address, ProofSignature};
use serde::*;

/// Open a new channel with a partner, optionally depositing at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChannel {
    /// Asset the channel escrows.
    pub asset: AssetId,
    /// The counterparty.
    pub partner: Address,
    /// Requested relative settle timeout, clamped to the configured bounds.
    pub settle_timeout: u64,
    /// Amount deposited by the opener at open; may be zero.
    pub amount: u64,
}

/// Raise the caller's cumulative deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositChannel {
    /// The channel.
    pub channel_id: ChannelId,
    /// The caller's new cumulative deposit.
    pub total_deposit: u64,
}

/// Withdraw with the counterparty's signed authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawChannel {
    /// The channel.
    pub channel_id: ChannelId,
    /// Authorization naming the caller as withdrawer.
    pub proof: WithdrawProof,
    /// The counterparty's signature over `proof`.
    pub partner_signature: ProofSignature,
}

/// Close the channel, submitting the counterparty's latest balance proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseChannel {
    /// The channel.
    pub channel_id: ChannelId,
    /// Balance proof signed by the participant who is not closing.
    pub non_closer_proof: BalanceProof,
    /// The non-closer's signature over `non_closer_proof`.
    pub non_closer_signature: ProofSignature,
}

/// Record the counterparty's latest balance proof without closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBalanceProof {
    /// The channel.
    pub channel_id: ChannelId,
    /// Balance proof signed by the counterparty.
    pub partner_proof: BalanceProof,
    /// The counterparty's signature over `partner_proof`.
    pub partner_signature: ProofSignature,
}

/// Pay out a closed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settle {
    /// The channel.
    pub channel_id: ChannelId,
    /// Cumulative amount the caller declares it sent the partner.
    pub self_transferred: u64,
    /// Cumulative amount the caller declares the partner sent it.
    pub partner_transferred: u64,
}

/// A channel action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// See [`OpenChannel`].
    Open(OpenChannel),
    /// See [`DepositChannel`].
    Deposit(DepositChannel),
    /// See [`WithdrawChannel`].
    Withdraw(WithdrawChannel),
    /// See [`CloseChannel`].
    Close(CloseChannel),
    /// See [`UpdateBalanceProof`].
    UpdateProof(UpdateBalanceProof),
    /// See [`Settle`].
    Settle(Settle),
}

impl Action {
    /// Serialize the action for a transaction payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Error::Codec)
    }

    /// Parse a transaction payload.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(Error::UndecodableAction)
    }

    /// Action name.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Open(_) => "Open",
            Action::Deposit(_) => "DepositChannel",
            Action::Withdraw(_) => "WithdrawChannel",
            Action::Close(_) => "Close",
            Action::UpdateProof(_) => "UpdateProof",
            Action::Settle(_) => "Settle",
        }
    }

    /// Numeric action type.
    pub fn type_id(&self) -> u32 {
        match self {
            Action::Open(_) => 101,
            Action::Deposit(_) => 102,
            Action::Withdraw(_) => 103,
            Action::Close(_) => 104,
            Action::UpdateProof(_) => 105,
            Action::Settle(_) => 106,
        }
    }

    /// Channel the action refers to; `None` for Open, whose channel does not exist yet.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Action::Open(_) => None,
            Action::Deposit(a) => Some(a.channel_id),
            Action::Withdraw(a) => Some(a.channel_id),
            Action::Close(a) => Some(a.channel_id),
            Action::UpdateProof(a) => Some(a.channel_id),
            Action::Settle(a) => Some(a.channel_id),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payload_survives_transport() {
        let action = Action::Deposit(DepositChannel {
            channel_id: ChannelId(4),
            total_deposit: 70,
        });
        let decoded = Action::decode(&action.encode().unwrap()).unwrap();
        assert_eq!(decoded, action);
        assert_eq!(decoded.type_id(), 102);
        assert_eq!(decoded.name(), "DepositChannel");
    }

    #[test]
    fn truncated_payload_is_structural_error() {
        let action = Action::Settle(Settle {
            channel_id: ChannelId(1),
            self_transferred: 1,
            partner_transferred: 2,
        });
        let bytes = action.encode().unwrap();
        let err = Action::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);
    }
}
