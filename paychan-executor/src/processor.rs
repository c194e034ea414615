/*!
The channel state machine.

An [`Executor`] applies one [`Action`] at a time. Execution reads the host's state but never writes
to it: every channel update and every escrow transfer goes into a [`StateBatch`], and only a fully
successful action turns that batch into a [`Receipt`]. A failure anywhere, including a transfer
the asset ledger refuses, drops the batch and leaves no trace.

The host is expected to apply actions in a single global order, so the read-modify-write of a
channel entry or of the id counter never interleaves with another action.
*/

use crate::{
    action::*,
    events::{Event, Receipt},
    ledger::{AssetLedger, ExecAccounts},
    proofs::CanonicalAsset,
    registry,
    store::{get_decoded, keys, put_encoded, KvStore, StateBatch, StateRead},
    validate::{CheckedAction, Checked},
    AssetId, Channel, ChannelId, ChannelState, Config, Error, ExecContext, Result,
};
use paychan_crypto::Address;
use std::convert::TryFrom;
use tracing::{debug, error, warn};

/// Executes channel actions against key/value state.
#[derive(Debug, Clone)]
pub struct Executor<L = ExecAccounts> {
    pub(crate) config: Config,
    pub(crate) ledger: L,
}

impl Default for Executor<ExecAccounts> {
    fn default() -> Self {
        let config = Config::default();
        let ledger = ExecAccounts::new(config.executor_name.clone());
        Self { config, ledger }
    }
}

impl Executor<ExecAccounts> {
    /// An executor keeping balances in its own state, under the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        let ledger = ExecAccounts::new(config.executor_name.clone());
        Self::with_ledger(config, ledger)
    }
}

impl<L: AssetLedger> Executor<L> {
    /// An executor moving funds through `ledger`.
    pub fn with_ledger(config: Config, ledger: L) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ledger })
    }

    /// The executor's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The asset ledger funds move through.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Validate and execute `action` against `state`. On success the returned [`Receipt`] holds
    /// every write the action makes; `state` itself is left untouched.
    pub fn exec<S: StateRead + ?Sized>(
        &self,
        state: &S,
        ctx: &ExecContext,
        action: &Action,
    ) -> Result<Receipt> {
        let checked = self.check(ctx, action)?;
        self.exec_checked(state, checked)
    }

    /// Execute `action` and apply its writes to `store`.
    pub fn exec_and_commit<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        ctx: &ExecContext,
        action: &Action,
    ) -> Result<Receipt> {
        let receipt = self.exec(&*store, ctx, action)?;
        receipt.commit(store)?;
        Ok(receipt)
    }

    /// Execute an action that already passed [`Executor::check`], under the context it was
    /// checked with.
    pub fn exec_checked<S: StateRead + ?Sized>(
        &self,
        state: &S,
        checked: CheckedAction<'_>,
    ) -> Result<Receipt> {
        let ctx = checked.ctx;
        let mut transition = Transition {
            executor: self,
            ctx,
            batch: StateBatch::new(state),
            events: Vec::new(),
        };

        let (name, outcome) = match checked.inner {
            Checked::Open(open) => ("Open", transition.open(open)),
            Checked::Deposit(deposit) => ("DepositChannel", transition.deposit(deposit)),
            Checked::Withdraw { action, partner } => {
                ("WithdrawChannel", transition.withdraw(action, partner))
            }
            Checked::Close { action, non_closer } => {
                ("Close", transition.close(action, non_closer))
            }
            Checked::UpdateProof { action, partner } => {
                ("UpdateProof", transition.update_proof(action, partner))
            }
            Checked::Settle(settle) => ("Settle", transition.settle(settle)),
        };

        if let Err(err) = outcome {
            if err.is_fatal() {
                error!(action = name, signer = %ctx.signer, error = %err, "action failed");
            } else {
                warn!(action = name, signer = %ctx.signer, error = %err, "action failed");
            }
            return Err(err);
        }

        let Transition { batch, events, .. } = transition;
        Ok(Receipt {
            writes: batch.into_writes(),
            events,
        })
    }
}

/// State of one action while it executes.
struct Transition<'e, 's, L, S: ?Sized> {
    executor: &'e Executor<L>,
    ctx: &'e ExecContext,
    batch: StateBatch<'s, S>,
    events: Vec<Event>,
}

impl<'e, 's, L: AssetLedger, S: StateRead + ?Sized> Transition<'e, 's, L, S> {
    fn executor_name(&self) -> &str {
        &self.executor.config.executor_name
    }

    fn load_channel(&self, channel_id: ChannelId) -> Result<Channel> {
        get_decoded(&self.batch, &keys::channel(self.executor_name(), channel_id))?
            .ok_or(Error::ChannelNotFound(channel_id))
    }

    fn save_channel(&mut self, channel: &Channel) -> Result<()> {
        let key = keys::channel(self.executor_name(), channel.channel_id);
        put_encoded(&mut self.batch, key, channel)
    }

    /// Move funds inside the executor's namespace.
    fn move_funds(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<()> {
        let namespace = self.executor.config.exec_address();
        let events = self
            .executor
            .ledger
            .transfer(&mut self.batch, asset, from, to, &namespace, amount)?;
        self.events.extend(events);
        Ok(())
    }

    fn require_asset(channel: &Channel, proof_asset: &CanonicalAsset) -> Result<()> {
        if proof_asset.matches(&channel.asset) {
            Ok(())
        } else {
            Err(Error::ChannelInfoNotMatch("proof asset"))
        }
    }

    fn open(&mut self, open: &OpenChannel) -> Result<()> {
        let config = &self.executor.config;
        let asset = config.normalize_asset(&open.asset);
        let settle_timeout = config.clamp_settle_timeout(open.settle_timeout);
        let opener = self.ctx.signer;

        let executor_name = config.executor_name.clone();
        let channel_id = registry::allocate(&mut self.batch, &executor_name)?;
        debug!(%channel_id, %opener, partner = %open.partner, amount = open.amount, "open channel");

        let mut channel = Channel::new(
            channel_id,
            asset.clone(),
            opener,
            open.partner,
            settle_timeout,
        );
        if open.amount > 0 {
            let escrow = self.executor.config.escrow_address(channel_id);
            self.move_funds(&asset, &opener, &escrow, open.amount)?;
            channel.participant1.total_deposit = open.amount;
            channel.total_amount = open.amount;
        }
        self.save_channel(&channel)?;

        self.events.push(Event::Open {
            opener,
            partner: open.partner,
            channel_id,
            initial_balance: open.amount,
            chain: self.ctx.chain.clone(),
            asset,
            settle_timeout,
        });
        Ok(())
    }

    fn deposit(&mut self, deposit: &DepositChannel) -> Result<()> {
        let channel_id = deposit.channel_id;
        let depositor = self.ctx.signer;
        debug!(%channel_id, %depositor, total_deposit = deposit.total_deposit, "deposit");

        let mut channel = self.load_channel(channel_id)?;
        channel.require_state(ChannelState::Open)?;
        let partner = channel.require_counterparty(&depositor)?;

        let available = channel.total_amount;
        let delta = {
            let (me, _) = channel.participant_pair_mut(&depositor, &partner)?;
            if deposit.total_deposit <= me.total_deposit {
                return Err(Error::TotalDepositAmount {
                    requested: deposit.total_deposit,
                    current: me.total_deposit,
                });
            }
            let delta = deposit.total_deposit - me.total_deposit;
            me.total_deposit = deposit.total_deposit;
            delta
        };
        channel.total_amount = available.checked_add(delta).ok_or(Error::AmountOverflow)?;

        let escrow = self.executor.config.escrow_address(channel_id);
        self.move_funds(&channel.asset, &depositor, &escrow, delta)?;
        self.save_channel(&channel)?;

        self.events.push(Event::Deposit {
            chain: self.ctx.chain.clone(),
            asset: channel.asset.clone(),
            channel_id,
            depositor,
            partner,
            total_deposit: deposit.total_deposit,
        });
        Ok(())
    }

    fn withdraw(&mut self, withdraw: &WithdrawChannel, partner: Address) -> Result<()> {
        let channel_id = withdraw.channel_id;
        let proof = &withdraw.proof;
        let withdrawer = self.ctx.signer;
        debug!(%channel_id, %withdrawer, %partner, total_withdraw = proof.total_withdraw, "withdraw");

        let mut channel = self.load_channel(channel_id)?;
        channel.require_state(ChannelState::Open)?;
        Self::require_asset(&channel, &proof.asset)?;

        let available = channel.total_amount;
        let amount = {
            let (me, _) = channel.participant_pair_mut(&withdrawer, &partner)?;
            let amount = proof.total_withdraw.saturating_sub(me.total_withdraw);
            if proof.total_withdraw <= me.total_withdraw || amount > available {
                return Err(Error::InvalidWithdrawAmount {
                    total_withdraw: proof.total_withdraw,
                    recorded: me.total_withdraw,
                    available,
                });
            }
            me.total_withdraw = proof.total_withdraw;
            amount
        };
        channel.total_amount = available - amount;

        let escrow = self.executor.config.escrow_address(channel_id);
        self.move_funds(&channel.asset, &escrow, &withdrawer, amount)?;
        self.save_channel(&channel)?;

        self.events.push(Event::Withdraw {
            channel_id,
            withdrawer,
            partner,
            total_withdraw: proof.total_withdraw,
        });
        Ok(())
    }

    fn close(&mut self, close: &CloseChannel, non_closer: Address) -> Result<()> {
        let channel_id = close.channel_id;
        let proof = &close.non_closer_proof;
        let closer = self.ctx.signer;
        debug!(%channel_id, %closer, %non_closer, nonce = %proof.nonce, "close");

        let mut channel = self.load_channel(channel_id)?;
        channel.require_state(ChannelState::Open)?;
        Self::require_asset(&channel, &proof.asset)?;

        let applied = {
            let (other, _) = channel.participant_pair_mut(&non_closer, &closer)?;
            other.adopt_balance_proof(proof.nonce, proof.transferred_amount)
        };
        if !applied {
            debug!(%channel_id, nonce = %proof.nonce, "close proof does not supersede recorded proof");
        }

        channel.settle_block_height = channel
            .settle_block_height
            .checked_add(self.ctx.height)
            .ok_or(Error::SettleHeightOverflow {
                channel_id,
                height: self.ctx.height,
            })?;
        channel.state = ChannelState::Closed;
        channel.closer = Some(closer);
        self.save_channel(&channel)?;

        self.events.push(Event::Close {
            chain: self.ctx.chain.clone(),
            asset: channel.asset.clone(),
            channel_id,
            closer,
            partner: non_closer,
        });
        Ok(())
    }

    fn update_proof(&mut self, update: &UpdateBalanceProof, partner: Address) -> Result<()> {
        let channel_id = update.channel_id;
        let proof = &update.partner_proof;
        let updater = self.ctx.signer;
        debug!(%channel_id, %updater, %partner, nonce = %proof.nonce, "update proof");

        let mut channel = self.load_channel(channel_id)?;
        Self::require_asset(&channel, &proof.asset)?;

        let applied = {
            let (other, _) = channel.participant_pair_mut(&partner, &updater)?;
            other.adopt_balance_proof(proof.nonce, proof.transferred_amount)
        };
        if applied {
            self.save_channel(&channel)?;
        } else {
            debug!(%channel_id, nonce = %proof.nonce, "stale balance proof ignored");
        }

        self.events.push(Event::UpdateProof {
            chain: self.ctx.chain.clone(),
            asset: channel.asset.clone(),
            channel_id,
            updater,
            partner,
            nonce: proof.nonce,
            applied,
        });
        Ok(())
    }

    fn settle(&mut self, settle: &Settle) -> Result<()> {
        let channel_id = settle.channel_id;
        let caller = self.ctx.signer;
        debug!(%channel_id, %caller, "settle");

        let mut channel = self.load_channel(channel_id)?;
        channel.require_state(ChannelState::Closed)?;
        if self.ctx.height < channel.settle_block_height {
            return Err(Error::ChannelCloseChallengePeriod {
                channel_id,
                settle_height: channel.settle_block_height,
                height: self.ctx.height,
            });
        }
        let partner = channel.require_counterparty(&caller)?;

        let (self_settle, partner_settle) = {
            let (me, other) = channel.participant_pair_mut(&caller, &partner)?;
            let net_transfer =
                i128::from(settle.self_transferred) - i128::from(settle.partner_transferred);
            (
                me.net_deposit() - net_transfer,
                other.net_deposit() + net_transfer,
            )
        };
        let invalid = || Error::InvalidTransferredAmount {
            self_settle,
            partner_settle,
        };
        let self_payout = u64::try_from(self_settle).map_err(|_| invalid())?;
        let partner_payout = u64::try_from(partner_settle).map_err(|_| invalid())?;

        channel.state = ChannelState::Settled;
        self.save_channel(&channel)?;

        self.events.push(Event::Settle {
            chain: self.ctx.chain.clone(),
            asset: channel.asset.clone(),
            channel_id,
            participant1: partner,
            transferred_amount1: settle.partner_transferred,
            participant2: caller,
            transferred_amount2: settle.self_transferred,
        });

        let escrow = self.executor.config.escrow_address(channel_id);
        if self_payout > 0 {
            self.move_funds(&channel.asset, &escrow, &caller, self_payout)?;
        }
        if partner_payout > 0 {
            self.move_funds(&channel.asset, &escrow, &partner, partner_payout)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        proofs::{BalanceProof, WithdrawProof},
        store::MemoryStore,
        ErrorKind, Nonce,
    };
    use paychan_crypto::Keypair;

    fn funded() -> (Executor, MemoryStore, Keypair, Keypair) {
        let exec: Executor = Executor::default();
        let mut store = MemoryStore::new();
        let a = Keypair::from_seed(&[1; 32]);
        let b = Keypair::from_seed(&[2; 32]);
        let asset = AssetId::new("coins", "bty");
        let ns = exec.config().exec_address();
        for kp in [&a, &b].iter() {
            let _ = exec
                .ledger()
                .credit(&mut store, &asset, &ns, &kp.address(), 1_000)
                .unwrap();
        }
        (exec, store, a, b)
    }

    fn open(partner: &Keypair, amount: u64) -> Action {
        Action::Open(OpenChannel {
            asset: AssetId::new("coins", ""),
            partner: partner.address(),
            settle_timeout: 20,
            amount,
        })
    }

    #[test]
    fn exec_does_not_write_base_state() {
        let (exec, store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let before = store.len();
        let receipt = exec.exec(&store, &ctx, &open(&b, 100)).unwrap();
        assert_eq!(store.len(), before);
        assert!(!receipt.writes.is_empty());
        assert_eq!(exec.channel_count(&store).unwrap(), 0);
    }

    #[test]
    fn failed_transfer_leaves_no_channel() {
        let (exec, mut store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let err = exec
            .exec_and_commit(&mut store, &ctx, &open(&b, 5_000))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));
        assert_eq!(exec.channel_count(&store).unwrap(), 0);
    }

    #[test]
    fn deposit_by_stranger_is_participant_error() {
        let (exec, mut store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let _ = exec.exec_and_commit(&mut store, &ctx, &open(&b, 0)).unwrap();

        let stranger = Keypair::from_seed(&[3; 32]);
        let deposit = Action::Deposit(DepositChannel {
            channel_id: ChannelId(1),
            total_deposit: 10,
        });
        let err = exec
            .exec(&store, &ctx.signed_by(stranger.address()), &deposit)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Participant);
    }

    #[test]
    fn deposit_must_raise_total() {
        let (exec, mut store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let _ = exec.exec_and_commit(&mut store, &ctx, &open(&b, 100)).unwrap();
        let deposit = Action::Deposit(DepositChannel {
            channel_id: ChannelId(1),
            total_deposit: 100,
        });
        let err = exec.exec(&store, &ctx, &deposit).unwrap_err();
        assert!(matches!(
            err,
            Error::TotalDepositAmount {
                requested: 100,
                current: 100
            }
        ));
    }

    #[test]
    fn settle_requires_closed_channel() {
        let (exec, mut store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let _ = exec.exec_and_commit(&mut store, &ctx, &open(&b, 100)).unwrap();
        let settle = Action::Settle(Settle {
            channel_id: ChannelId(1),
            self_transferred: 0,
            partner_transferred: 0,
        });
        let err = exec.exec(&store, &ctx.at_height(1_000), &settle).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::State);
    }

    #[test]
    fn missing_channel_is_not_found() {
        let (exec, store, a, _) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let deposit = Action::Deposit(DepositChannel {
            channel_id: ChannelId(9),
            total_deposit: 10,
        });
        assert!(matches!(
            exec.exec(&store, &ctx, &deposit),
            Err(Error::ChannelNotFound(ChannelId(9)))
        ));
    }

    fn proof_asset() -> CanonicalAsset {
        CanonicalAsset::new("bityuan", "coins", "bty")
    }

    #[test]
    fn checked_withdraw_runs_under_its_own_context() {
        let (exec, mut store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let _ = exec.exec_and_commit(&mut store, &ctx, &open(&b, 100)).unwrap();

        let proof = WithdrawProof {
            channel_id: ChannelId(1),
            withdrawer: a.address(),
            total_withdraw: 30,
            expiration_block: 10,
            asset: proof_asset(),
        };
        let action = Action::Withdraw(WithdrawChannel {
            channel_id: ChannelId(1),
            partner_signature: b.sign(&proof),
            proof,
        });

        // Valid at height 5; the same proof is expired at height 500.
        let at_five = ctx.at_height(5);
        let checked = exec.check(&at_five, &action).unwrap();
        assert_eq!(checked.context().height, 5);
        let receipt = exec.exec_checked(&store, checked).unwrap();
        assert!(receipt.channel_events().any(|event| matches!(
            event,
            Event::Withdraw { withdrawer, .. } if *withdrawer == a.address()
        )));

        let late = ctx.at_height(500);
        let err = exec.check(&late, &action).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn checked_proof_stays_bound_to_its_chain() {
        let (exec, mut store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let _ = exec.exec_and_commit(&mut store, &ctx, &open(&b, 100)).unwrap();

        let proof = BalanceProof {
            channel_id: ChannelId(1),
            nonce: Nonce(1),
            transferred_amount: 10,
            asset: proof_asset(),
            addition_hash: Vec::new(),
        };
        let action = Action::UpdateProof(UpdateBalanceProof {
            channel_id: ChannelId(1),
            partner_signature: b.sign(&proof),
            partner_proof: proof,
        });

        let checked = exec.check(&ctx, &action).unwrap();
        assert_eq!(checked.context().chain, "bityuan");
        let receipt = exec.exec_checked(&store, checked).unwrap();
        assert!(receipt.channel_events().all(|event| match event {
            Event::UpdateProof { chain, applied, .. } => chain == "bityuan" && *applied,
            _ => false,
        }));

        let elsewhere = ExecContext::new(1, a.address(), "otherchain");
        let err = exec.check(&elsewhere, &action).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn close_at_the_last_height_is_a_timeout() {
        let (exec, mut store, a, b) = funded();
        let ctx = ExecContext::new(1, a.address(), "bityuan");
        let _ = exec.exec_and_commit(&mut store, &ctx, &open(&b, 100)).unwrap();

        let proof = BalanceProof {
            channel_id: ChannelId(1),
            nonce: Nonce(1),
            transferred_amount: 0,
            asset: proof_asset(),
            addition_hash: Vec::new(),
        };
        let close = Action::Close(CloseChannel {
            channel_id: ChannelId(1),
            non_closer_signature: b.sign(&proof),
            non_closer_proof: proof,
        });
        let err = exec
            .exec(&store, &ctx.at_height(u64::MAX), &close)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SettleHeightOverflow {
                channel_id: ChannelId(1),
                height: u64::MAX
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(
            exec.get_channel(&store, ChannelId(1)).unwrap().state,
            ChannelState::Open
        );
    }
}
