/*!
The asset ledger the executor moves escrowed funds through.

Balances are scoped by asset and by namespace: an account holds a separate balance of each asset
inside each namespace. Channel funds always move inside the executor's own namespace, between a
participant's account and the channel's escrow account.

[`ExecAccounts`] keeps balances in the same key/value state as the channels, so a transfer made
while executing an action lands in the action's write batch and is committed, or dropped, together
with the channel update.
*/

use crate::{
    events::Event,
    store::{get_decoded, keys, put_encoded, KvStore, StateRead},
    AssetId, Error, Result,
};
use paychan_crypto::Address;
use tracing::warn;

/// Moves funds between accounts.
pub trait AssetLedger {
    /// Move `amount` of `asset` from `from` to `to` inside `namespace`, returning the events that
    /// describe the movement. Fails with [`Error::InsufficientBalance`] if `from` cannot cover it.
    fn transfer<S: KvStore + ?Sized>(
        &self,
        state: &mut S,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        namespace: &Address,
        amount: u64,
    ) -> Result<Vec<Event>>;
}

/// Account balances kept in the executor's key/value state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecAccounts {
    executor_name: String,
}

impl ExecAccounts {
    /// Accounts stored under the given executor's key prefix.
    pub fn new(executor_name: impl Into<String>) -> Self {
        Self {
            executor_name: executor_name.into(),
        }
    }

    fn key(&self, asset: &AssetId, namespace: &Address, address: &Address) -> Vec<u8> {
        keys::account(
            &self.executor_name,
            &asset.issue_contract,
            &asset.token_symbol,
            namespace,
            address,
        )
    }

    /// Balance of `address` in `asset` inside `namespace` (0 if the account was never funded).
    pub fn balance<S: StateRead + ?Sized>(
        &self,
        state: &S,
        asset: &AssetId,
        namespace: &Address,
        address: &Address,
    ) -> Result<u64> {
        Ok(get_decoded(state, &self.key(asset, namespace, address))?.unwrap_or(0))
    }

    /// Add `amount` to an account. Hosts use this to fund participants before they open channels.
    pub fn credit<S: KvStore + ?Sized>(
        &self,
        state: &mut S,
        asset: &AssetId,
        namespace: &Address,
        address: &Address,
        amount: u64,
    ) -> Result<u64> {
        let balance = self.balance(&*state, asset, namespace, address)?;
        let balance = balance.checked_add(amount).ok_or(Error::AmountOverflow)?;
        put_encoded(state, self.key(asset, namespace, address), &balance)?;
        Ok(balance)
    }
}

impl AssetLedger for ExecAccounts {
    fn transfer<S: KvStore + ?Sized>(
        &self,
        state: &mut S,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        namespace: &Address,
        amount: u64,
    ) -> Result<Vec<Event>> {
        let from_balance = self.balance(&*state, asset, namespace, from)?;
        if from_balance < amount {
            warn!(%from, %asset, available = from_balance, needed = amount, "insufficient balance");
            return Err(Error::InsufficientBalance {
                address: *from,
                available: from_balance,
                needed: amount,
            });
        }

        let (from_balance, to_balance) = if from == to {
            (from_balance, from_balance)
        } else {
            let to_balance = self
                .balance(&*state, asset, namespace, to)?
                .checked_add(amount)
                .ok_or(Error::AmountOverflow)?;
            let from_balance = from_balance - amount;
            put_encoded(state, self.key(asset, namespace, from), &from_balance)?;
            put_encoded(state, self.key(asset, namespace, to), &to_balance)?;
            (from_balance, to_balance)
        };

        Ok(vec![Event::Transfer {
            asset: asset.clone(),
            namespace: *namespace,
            from: *from,
            to: *to,
            amount,
            from_balance,
            to_balance,
        }])
    }
}
