/*!
Stateless checks applied to an action before it touches state.

[`Executor::check`] rejects malformed payloads and verifies every proof signature. Its output, a
[`CheckedAction`], carries the addresses recovered from those signatures together with the
[`ExecContext`] they were checked against. It cannot be built any other way, and it executes only
under that same context, so execution only ever sees counterparties whose signatures have been
verified for the height, signer and chain at hand.
*/

use crate::{
    action::*,
    proofs::{BalanceProof, CanonicalAsset},
    AssetLedger, ChannelId, Error, ExecContext, Executor, Result,
};
use paychan_crypto::{recover_address, Address, ProofSignature};
use tracing::warn;

/// An action that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct CheckedAction<'a> {
    pub(crate) ctx: &'a ExecContext,
    pub(crate) inner: Checked<'a>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Checked<'a> {
    Open(&'a OpenChannel),
    Deposit(&'a DepositChannel),
    Withdraw {
        action: &'a WithdrawChannel,
        partner: Address,
    },
    Close {
        action: &'a CloseChannel,
        non_closer: Address,
    },
    UpdateProof {
        action: &'a UpdateBalanceProof,
        partner: Address,
    },
    Settle(&'a Settle),
}

impl<'a> CheckedAction<'a> {
    /// The context the action was validated against, and will execute under.
    pub fn context(&self) -> &'a ExecContext {
        self.ctx
    }

    /// The counterparty whose signature was verified, if the action carries a proof.
    pub fn signer_of_proof(&self) -> Option<Address> {
        match self.inner {
            Checked::Withdraw { partner, .. } | Checked::UpdateProof { partner, .. } => {
                Some(partner)
            }
            Checked::Close { non_closer, .. } => Some(non_closer),
            _ => None,
        }
    }
}

fn require_channel_id(channel_id: ChannelId) -> Result<()> {
    if channel_id.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidParam("channel id must be positive"))
    }
}

fn check_binding(
    expected_id: ChannelId,
    proof_id: ChannelId,
    asset: &CanonicalAsset,
    ctx: &ExecContext,
) -> Result<()> {
    if proof_id != expected_id {
        return Err(Error::ChannelInfoNotMatch("proof channel id"));
    }
    if asset.chain != ctx.chain {
        return Err(Error::ChannelInfoNotMatch("proof chain"));
    }
    Ok(())
}

fn check_balance_proof(
    channel_id: ChannelId,
    proof: &BalanceProof,
    signature: &ProofSignature,
    ctx: &ExecContext,
) -> Result<Address> {
    require_channel_id(channel_id)?;
    check_binding(channel_id, proof.channel_id, &proof.asset, ctx)?;
    Ok(recover_address(proof, signature)?)
}

impl<L: AssetLedger> Executor<L> {
    /// Validate an action without reading state.
    pub fn check<'a>(
        &self,
        ctx: &'a ExecContext,
        action: &'a Action,
    ) -> Result<CheckedAction<'a>> {
        let checked = match action {
            Action::Open(open) => self.check_open(ctx, open).map(|()| Checked::Open(open)),
            Action::Deposit(deposit) => {
                check_deposit(deposit).map(|()| Checked::Deposit(deposit))
            }
            Action::Withdraw(withdraw) => check_withdraw(ctx, withdraw)
                .map(|partner| Checked::Withdraw {
                    action: withdraw,
                    partner,
                }),
            Action::Close(close) => check_balance_proof(
                close.channel_id,
                &close.non_closer_proof,
                &close.non_closer_signature,
                ctx,
            )
            .map(|non_closer| Checked::Close {
                action: close,
                non_closer,
            }),
            Action::UpdateProof(update) => check_balance_proof(
                update.channel_id,
                &update.partner_proof,
                &update.partner_signature,
                ctx,
            )
            .map(|partner| Checked::UpdateProof {
                action: update,
                partner,
            }),
            Action::Settle(settle) => {
                require_channel_id(settle.channel_id).map(|()| Checked::Settle(settle))
            }
        };

        match checked {
            Ok(inner) => Ok(CheckedAction { ctx, inner }),
            Err(err) => {
                warn!(
                    action = action.name(),
                    channel_id = ?action.channel_id(),
                    signer = %ctx.signer,
                    error = %err,
                    "action rejected before execution"
                );
                Err(err)
            }
        }
    }

    fn check_open(&self, ctx: &ExecContext, open: &OpenChannel) -> Result<()> {
        if open.asset.issue_contract.is_empty() {
            return Err(Error::InvalidParam("asset issue contract is empty"));
        }
        if !self.config.is_native(&open.asset) && open.asset.token_symbol.is_empty() {
            return Err(Error::InvalidParam("non-native asset requires a token symbol"));
        }
        if open.partner.is_zero() {
            return Err(Error::InvalidParam("partner address is empty"));
        }
        if open.partner == ctx.signer {
            return Err(Error::InvalidParticipants {
                first: ctx.signer,
                second: open.partner,
            });
        }
        Ok(())
    }
}

fn check_deposit(deposit: &DepositChannel) -> Result<()> {
    require_channel_id(deposit.channel_id)?;
    if deposit.total_deposit == 0 {
        return Err(Error::InvalidParam("total deposit must be positive"));
    }
    Ok(())
}

fn check_withdraw(ctx: &ExecContext, withdraw: &WithdrawChannel) -> Result<Address> {
    let proof = &withdraw.proof;
    require_channel_id(withdraw.channel_id)?;
    if proof.total_withdraw == 0 {
        return Err(Error::InvalidParam("total withdraw must be positive"));
    }
    check_binding(withdraw.channel_id, proof.channel_id, &proof.asset, ctx)?;
    if proof.withdrawer != ctx.signer {
        return Err(Error::WithdrawSign {
            withdrawer: proof.withdrawer,
            signer: ctx.signer,
        });
    }
    if ctx.height >= proof.expiration_block {
        return Err(Error::WithdrawBlockExpiration {
            expiration: proof.expiration_block,
            height: ctx.height,
        });
    }
    Ok(recover_address(proof, &withdraw.partner_signature)?)
}
