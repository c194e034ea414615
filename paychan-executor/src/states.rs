/*!
Defines the persisted state of a channel.

The primary type is a [`Channel`], the ledger entry for one two-party channel. It is created by
Open with both [`Participant`]s at zero, mutated by Deposit, Withdraw, Close and UpdateProof, and
reaches its last mutation at Settle. Entries are never deleted.

A channel moves through its [`ChannelState`]s in one direction only:

```text
Open --close--> Closed --settle--> Settled
```

While the channel is open, `settle_block_height` holds the relative settle timeout chosen at
Open. Close adds the closing height to it, turning it into the absolute height at which Settle
unlocks.
*/

use crate::{Error, Nonce, Result};
use paychan_crypto::{Address, DigestBuilder, ProofDigest};
use serde::*;
use std::fmt;

/// Channel identifier. Allocated by the registry, starting at 1 and strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// The raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Identifiers start at 1; zero never names a channel.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ProofDigest for ChannelId {
    fn digest(&self, builder: &mut DigestBuilder) {
        self.0.digest(builder);
    }
}

/// Lifecycle phase of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    /// Reserved; never stored.
    NonExistent,
    /// Accepting deposits, withdrawals and proof updates.
    Open,
    /// Closed by one participant; waiting out the challenge period.
    Closed,
    /// Funds paid out. Terminal.
    Settled,
    /// Reserved; never stored.
    Removed,
}

/// The asset a channel escrows: the issuing contract and token symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AssetId {
    /// Contract issuing the asset; the host's native asset lives under the native contract.
    pub issue_contract: String,
    /// Token symbol. May be left empty for the native asset.
    pub token_symbol: String,
}

impl AssetId {
    /// Construct an asset identifier.
    pub fn new(issue_contract: impl Into<String>, token_symbol: impl Into<String>) -> Self {
        Self {
            issue_contract: issue_contract.into(),
            token_symbol: token_symbol.into(),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.issue_contract, self.token_symbol)
    }
}

/// One of the two parties to a channel, with their running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participant {
    /// The participant's address.
    pub address: Address,
    /// Cumulative amount deposited. Never decreases.
    pub total_deposit: u64,
    /// Cumulative amount withdrawn. Never decreases.
    pub total_withdraw: u64,
    /// Nonce of the latest accepted balance proof signed by this participant.
    pub nonce: Nonce,
    /// Cumulative amount this participant has attested to sending the counterparty.
    pub transferred_amount: u64,
}

impl Participant {
    /// A participant with all totals at zero.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Adopt a signed balance proof if its nonce supersedes the recorded one. Returns whether the
    /// proof was adopted.
    pub(crate) fn adopt_balance_proof(&mut self, nonce: Nonce, transferred_amount: u64) -> bool {
        if !nonce.supersedes(self.nonce) {
            return false;
        }
        self.nonce = nonce;
        self.transferred_amount = transferred_amount;
        true
    }

    /// Funds still attributable to this participant before transfers are netted.
    pub(crate) fn net_deposit(&self) -> i128 {
        i128::from(self.total_deposit) - i128::from(self.total_withdraw)
    }
}

/// The persisted record for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// The channel's identifier.
    pub channel_id: ChannelId,
    /// Current lifecycle phase.
    pub state: ChannelState,
    /// Escrowed asset.
    pub asset: AssetId,
    /// Funds currently escrowed: deposits minus withdrawals.
    pub total_amount: u64,
    /// Relative settle timeout while open; absolute unlock height once closed.
    pub settle_block_height: u64,
    /// The participant that closed the channel, once closed.
    pub closer: Option<Address>,
    /// The opener.
    pub participant1: Participant,
    /// The opener's partner.
    pub participant2: Participant,
}

#[cfg(feature = "sqlite")]
paychan_crypto::impl_sqlx_for_bincode_ty!(Channel);

impl Channel {
    /// A freshly opened channel with both participants at zero.
    pub fn new(
        channel_id: ChannelId,
        asset: AssetId,
        opener: Address,
        partner: Address,
        settle_timeout: u64,
    ) -> Self {
        Self {
            channel_id,
            state: ChannelState::Open,
            asset,
            total_amount: 0,
            settle_block_height: settle_timeout,
            closer: None,
            participant1: Participant::new(opener),
            participant2: Participant::new(partner),
        }
    }

    /// Look up a participant by address.
    pub fn participant(&self, address: &Address) -> Option<&Participant> {
        [&self.participant1, &self.participant2]
            .iter()
            .copied()
            .find(|p| &p.address == address)
    }

    /// The other participant's address, if `address` is a participant.
    pub fn counterparty_of(&self, address: &Address) -> Option<Address> {
        if &self.participant1.address == address {
            Some(self.participant2.address)
        } else if &self.participant2.address == address {
            Some(self.participant1.address)
        } else {
            None
        }
    }

    /// The other participant's address, failing if `address` is not a participant.
    pub(crate) fn require_counterparty(&self, address: &Address) -> Result<Address> {
        self.counterparty_of(address)
            .ok_or(Error::NotParticipant {
                channel_id: self.channel_id,
                address: *address,
            })
    }

    /// Mutable access to the participant entries for two distinct participants, in the order
    /// given. Fails unless `first` and `second` are exactly this channel's two participants.
    pub(crate) fn participant_pair_mut(
        &mut self,
        first: &Address,
        second: &Address,
    ) -> Result<(&mut Participant, &mut Participant)> {
        let invalid = || Error::InvalidParticipants {
            first: *first,
            second: *second,
        };
        if first == second {
            return Err(invalid());
        }
        let (p1, p2) = (&mut self.participant1, &mut self.participant2);
        if &p1.address == first && &p2.address == second {
            Ok((p1, p2))
        } else if &p2.address == first && &p1.address == second {
            Ok((p2, p1))
        } else {
            Err(invalid())
        }
    }

    /// Fail unless the channel is in the `expected` state.
    pub(crate) fn require_state(&self, expected: ChannelState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::ChannelState {
                channel_id: self.channel_id,
                state: self.state,
                expected,
            })
        }
    }
}
