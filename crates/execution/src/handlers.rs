//! Per-kind action semantics.
//!
//! Every handler validates before it mutates and returns a [`DropReason`]
//! on the first failed check. Handlers run against a staged ledger, so an
//! error after a partial write still leaves the committed ledger untouched.

use hypercore_actions::{
    Action, CrossDexSend, SpotSend, StakingDeposit, StakingWithdraw, UsdClassTransfer,
    VaultTransfer,
};
use hypercore_core::{DropReason, MirrorTransfer};
use hypercore_ledger::LedgerStore;
use hypercore_timelock::{DeferredEffect, SettlementConfig};
use hypercore_types::{
    evm_to_wei, rescale, wei_to_evm, Address, DexId, TokenId, TokenInfo, TokenRegistry,
    PERP_USD_DECIMALS,
};
use std::time::Duration;

/// Everything a handler may read besides the ledger.
pub(crate) struct Context<'a> {
    pub registry: &'a TokenRegistry,
    pub settlement: SettlementConfig,
    pub usd_token: TokenId,
    pub staking_token: TokenId,
    pub sender: Address,
    pub now: Duration,
}

impl Context<'_> {
    fn token(&self, token: TokenId) -> Result<&TokenInfo, DropReason> {
        self.registry
            .get(token)
            .ok_or(DropReason::UnknownToken(token))
    }

    /// Check if `destination` is where `token` is withdrawn to the EVM.
    fn is_withdrawal_address(&self, destination: &Address, token: TokenId) -> bool {
        *destination == Address::system_for_token(token)
            || (token == self.staking_token && *destination == Address::NATIVE_SYSTEM)
    }
}

/// Side effects of a committed action, registered after commit.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pub deferred: Vec<DeferredEffect>,
    pub mirrored: Vec<MirrorTransfer>,
}

impl Effects {
    fn deferred(effect: DeferredEffect) -> Self {
        Self {
            deferred: vec![effect],
            ..Default::default()
        }
    }

    fn mirrored(transfer: MirrorTransfer) -> Self {
        Self {
            mirrored: vec![transfer],
            ..Default::default()
        }
    }
}

pub(crate) fn apply_action(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    action: &Action,
) -> Result<Effects, DropReason> {
    if !ledger.is_created(&ctx.sender) {
        return Err(DropReason::AccountNotCreated(ctx.sender));
    }

    match action {
        Action::SpotSend(send) => spot_send(ledger, ctx, send),
        Action::UsdClassTransfer(transfer) => usd_class_transfer(ledger, ctx, transfer),
        Action::VaultTransfer(transfer) if transfer.is_deposit => vault_deposit(ledger, ctx, transfer),
        Action::VaultTransfer(transfer) => vault_withdraw(ledger, ctx, transfer),
        Action::StakingDeposit(deposit) => staking_deposit(ledger, ctx, deposit),
        Action::StakingWithdraw(withdraw) => staking_withdraw(ledger, ctx, withdraw),
        Action::CrossDexSend(send) => cross_dex_send(ledger, ctx, send),
    }
}

fn spot_send(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    send: &SpotSend,
) -> Result<Effects, DropReason> {
    let info = ctx.token(send.token)?;

    if ctx.is_withdrawal_address(&send.destination, send.token) {
        let evm_amount = wei_to_evm(send.wei, info.evm_extra_wei_decimals)
            .ok_or(DropReason::AmountOutOfRange)?;
        ledger.debit_balance(ctx.sender, DexId::SPOT, send.token, send.wei)?;
        return Ok(Effects::mirrored(MirrorTransfer {
            recipient: ctx.sender,
            token: send.token,
            evm_amount,
        }));
    }

    if !ledger.is_created(&send.destination) {
        return Err(DropReason::DestinationNotCreated(send.destination));
    }
    ledger.transfer_balance(
        (ctx.sender, DexId::SPOT),
        (send.destination, DexId::SPOT),
        send.token,
        send.wei,
    )?;
    Ok(Effects::default())
}

fn usd_class_transfer(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    transfer: &UsdClassTransfer,
) -> Result<Effects, DropReason> {
    let wei_decimals = ctx.token(ctx.usd_token)?.wei_decimals;

    // Reject notionals the spot token cannot represent exactly.
    let wei = rescale(transfer.ntl, PERP_USD_DECIMALS, wei_decimals)
        .filter(|wei| rescale(*wei, wei_decimals, PERP_USD_DECIMALS) == Some(transfer.ntl))
        .ok_or(DropReason::AmountOutOfRange)?;

    if transfer.to_perp {
        ledger.debit_balance(ctx.sender, DexId::SPOT, ctx.usd_token, wei)?;
        ledger.credit_withdrawable(ctx.sender, transfer.ntl)?;
    } else {
        ledger.debit_withdrawable(ctx.sender, transfer.ntl)?;
        ledger.credit_balance(ctx.sender, DexId::SPOT, ctx.usd_token, wei)?;
    }
    Ok(Effects::default())
}

fn vault_deposit(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    transfer: &VaultTransfer,
) -> Result<Effects, DropReason> {
    let locked_until = ctx.now.saturating_add(ctx.settlement.vault_lockup);
    ledger.debit_withdrawable(ctx.sender, transfer.usd)?;
    ledger.credit_vault_equity(ctx.sender, transfer.vault, transfer.usd, locked_until)?;
    Ok(Effects::default())
}

/// First phase of a withdrawal: equity leaves the vault now, the
/// withdrawable credit is deferred.
fn vault_withdraw(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    transfer: &VaultTransfer,
) -> Result<Effects, DropReason> {
    let entry = ledger.vault_equity(&ctx.sender, &transfer.vault);
    if !entry.is_unlocked(ctx.now) {
        return Err(DropReason::VaultLocked {
            vault: transfer.vault,
            locked_until: entry.locked_until,
        });
    }
    if entry.equity == 0 {
        return Err(DropReason::NoVaultEquity {
            vault: transfer.vault,
        });
    }

    ledger.debit_vault_equity(ctx.sender, transfer.vault, transfer.usd)?;
    Ok(Effects::deferred(DeferredEffect::WithdrawableCredit {
        account: ctx.sender,
        usd: transfer.usd,
    }))
}

fn staking_deposit(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    deposit: &StakingDeposit,
) -> Result<Effects, DropReason> {
    ledger.debit_balance(ctx.sender, DexId::SPOT, ctx.staking_token, deposit.wei)?;
    ledger.stake(ctx.sender, deposit.wei)?;
    Ok(Effects::default())
}

fn staking_withdraw(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    withdraw: &StakingWithdraw,
) -> Result<Effects, DropReason> {
    ledger.begin_unstake(ctx.sender, withdraw.wei)?;
    Ok(Effects::deferred(DeferredEffect::StakingRelease {
        account: ctx.sender,
        wei: withdraw.wei,
    }))
}

fn cross_dex_send(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    send: &CrossDexSend,
) -> Result<Effects, DropReason> {
    ctx.token(send.token)?;

    let source = if send.sub_account.is_zero() {
        ctx.sender
    } else if ledger.master_of(&send.sub_account) == Some(ctx.sender) {
        send.sub_account
    } else {
        return Err(DropReason::UnknownSubAccount {
            master: ctx.sender,
            sub: send.sub_account,
        });
    };

    if !ledger.is_created(&send.destination) {
        return Err(DropReason::DestinationNotCreated(send.destination));
    }
    ledger.transfer_balance(
        (source, send.source_dex),
        (send.destination, send.destination_dex),
        send.token,
        send.wei,
    )?;
    Ok(Effects::default())
}

/// Credit a bridge deposit to the sender's spot balance.
///
/// Amounts that do not convert to a whole number of wei are dropped, so
/// the full EVM amount stays with the bridge.
pub(crate) fn apply_bridge_deposit(
    ledger: &mut LedgerStore,
    ctx: &Context<'_>,
    token: TokenId,
    evm_amount: u128,
) -> Result<Effects, DropReason> {
    let info = ctx.token(token)?;
    let wei =
        evm_to_wei(evm_amount, info.evm_extra_wei_decimals).ok_or(DropReason::AmountOutOfRange)?;
    if wei_to_evm(wei, info.evm_extra_wei_decimals) != Some(evm_amount) {
        return Err(DropReason::InexactAmount { evm_amount });
    }
    if !ledger.is_created(&ctx.sender) {
        return Err(DropReason::AccountNotCreated(ctx.sender));
    }
    ledger.credit_balance(ctx.sender, DexId::SPOT, token, wei)?;
    Ok(Effects::default())
}
