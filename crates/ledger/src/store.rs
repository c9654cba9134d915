//! The ledger aggregate.

use crate::{DelegatorSummary, LedgerError, PerpAccountState, SpotBalance, UserVaultEquity};
use hypercore_types::{Address, DexId, TokenId, VaultAddress};
use im::{OrdMap, OrdSet};
use std::time::Duration;
use tracing::debug;

/// Key of a token balance: owner, dex partition, token.
pub type BalanceKey = (Address, DexId, TokenId);

/// All sub-ledgers, keyed by account.
///
/// Each sub-ledger is an independent persistent map, so cloning the store is
/// O(1) and a clone is a stable snapshot. Checked mutations validate before
/// writing: a rejected mutation leaves the store exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    /// Activated accounts. Only these may receive transfers.
    accounts: OrdSet<Address>,

    /// sub-account -> master account
    sub_accounts: OrdMap<Address, Address>,

    /// Token balances per dex partition. Spot lives in `DexId::SPOT`.
    balances: OrdMap<BalanceKey, u64>,

    perps: OrdMap<Address, PerpAccountState>,

    vaults: OrdMap<(Address, VaultAddress), UserVaultEquity>,

    delegators: OrdMap<Address, DelegatorSummary>,
}

/// Read-modify-write on a map entry, writing back only if `f` succeeds.
fn update<K, V, T>(
    map: &mut OrdMap<K, V>,
    key: K,
    f: impl FnOnce(&mut V) -> Result<T, LedgerError>,
) -> Result<T, LedgerError>
where
    K: Ord + Clone,
    V: Clone + Default,
{
    let mut value = map.get(&key).cloned().unwrap_or_default();
    let out = f(&mut value)?;
    map.insert(key, value);
    Ok(out)
}

impl LedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Accounts
    // ═══════════════════════════════════════════════════════════════════════════

    /// Activate an account. Returns false if it already existed.
    pub fn create_account(&mut self, account: Address) -> bool {
        let created = self.accounts.insert(account).is_none();
        if created {
            debug!(%account, "Account created");
        }
        created
    }

    /// Check if an account has been activated.
    pub fn is_created(&self, account: &Address) -> bool {
        self.accounts.contains(account)
    }

    /// Register `sub` as a sub-account of `master`. Both become activated.
    pub fn register_sub_account(&mut self, master: Address, sub: Address) {
        self.create_account(master);
        self.create_account(sub);
        self.sub_accounts.insert(sub, master);
    }

    /// Master account of a sub-account.
    pub fn master_of(&self, sub: &Address) -> Option<Address> {
        self.sub_accounts.get(sub).copied()
    }

    /// Number of activated accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Token balances
    // ═══════════════════════════════════════════════════════════════════════════

    /// Spot balance of a token.
    pub fn spot_balance(&self, account: &Address, token: TokenId) -> SpotBalance {
        SpotBalance::with_total(self.dex_balance(account, DexId::SPOT, token))
    }

    /// Check if a spot balance entry exists at all (even at zero).
    pub fn has_spot_entry(&self, account: &Address, token: TokenId) -> bool {
        self.balances.contains_key(&(*account, DexId::SPOT, token))
    }

    /// Balance of a token in a dex partition.
    pub fn dex_balance(&self, account: &Address, dex: DexId, token: TokenId) -> u64 {
        self.balances
            .get(&(*account, dex, token))
            .copied()
            .unwrap_or(0)
    }

    pub fn credit_balance(
        &mut self,
        account: Address,
        dex: DexId,
        token: TokenId,
        wei: u64,
    ) -> Result<(), LedgerError> {
        update(&mut self.balances, (account, dex, token), |balance| {
            *balance = balance.checked_add(wei).ok_or(LedgerError::Overflow)?;
            Ok(())
        })
    }

    pub fn debit_balance(
        &mut self,
        account: Address,
        dex: DexId,
        token: TokenId,
        wei: u64,
    ) -> Result<(), LedgerError> {
        update(&mut self.balances, (account, dex, token), |balance| {
            *balance = balance
                .checked_sub(wei)
                .ok_or(LedgerError::InsufficientBalance {
                    account,
                    dex,
                    token,
                    available: *balance,
                    requested: wei,
                })?;
            Ok(())
        })
    }

    /// Move a token balance between two (account, dex) partitions.
    ///
    /// Validates the debit before touching anything.
    pub fn transfer_balance(
        &mut self,
        from: (Address, DexId),
        to: (Address, DexId),
        token: TokenId,
        wei: u64,
    ) -> Result<(), LedgerError> {
        let available = self.dex_balance(&from.0, from.1, token);
        if available < wei {
            return Err(LedgerError::InsufficientBalance {
                account: from.0,
                dex: from.1,
                token,
                available,
                requested: wei,
            });
        }
        if from == to {
            return Ok(());
        }
        let received = self.dex_balance(&to.0, to.1, token);
        if received.checked_add(wei).is_none() {
            return Err(LedgerError::Overflow);
        }

        self.debit_balance(from.0, from.1, token, wei)?;
        self.credit_balance(to.0, to.1, token, wei)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Perp
    // ═══════════════════════════════════════════════════════════════════════════

    /// Perp margin state of an account.
    pub fn perp_state(&self, account: &Address) -> PerpAccountState {
        self.perps.get(account).copied().unwrap_or_default()
    }

    /// USD withdrawable from perp, 6 decimals.
    pub fn withdrawable(&self, account: &Address) -> u64 {
        self.perp_state(account).withdrawable
    }

    pub fn credit_withdrawable(&mut self, account: Address, usd: u64) -> Result<(), LedgerError> {
        update(&mut self.perps, account, |perp| {
            perp.withdrawable = perp
                .withdrawable
                .checked_add(usd)
                .ok_or(LedgerError::Overflow)?;
            Ok(())
        })
    }

    pub fn debit_withdrawable(&mut self, account: Address, usd: u64) -> Result<(), LedgerError> {
        update(&mut self.perps, account, |perp| {
            perp.withdrawable =
                perp.withdrawable
                    .checked_sub(usd)
                    .ok_or(LedgerError::InsufficientWithdrawable {
                        account,
                        available: perp.withdrawable,
                        requested: usd,
                    })?;
            Ok(())
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Vaults
    // ═══════════════════════════════════════════════════════════════════════════

    /// Equity of an account in a vault. Zero and unlocked if absent.
    pub fn vault_equity(&self, account: &Address, vault: &VaultAddress) -> UserVaultEquity {
        self.vaults
            .get(&(*account, *vault))
            .copied()
            .unwrap_or_default()
    }

    /// Add equity and extend the lock to at least `locked_until`.
    pub fn credit_vault_equity(
        &mut self,
        account: Address,
        vault: VaultAddress,
        usd: u64,
        locked_until: Duration,
    ) -> Result<(), LedgerError> {
        update(&mut self.vaults, (account, vault), |entry| {
            entry.equity = entry.equity.checked_add(usd).ok_or(LedgerError::Overflow)?;
            entry.locked_until = entry.locked_until.max(locked_until);
            Ok(())
        })
    }

    /// Remove equity. Lock enforcement is the caller's concern.
    pub fn debit_vault_equity(
        &mut self,
        account: Address,
        vault: VaultAddress,
        usd: u64,
    ) -> Result<(), LedgerError> {
        update(&mut self.vaults, (account, vault), |entry| {
            entry.equity = entry
                .equity
                .checked_sub(usd)
                .ok_or(LedgerError::InsufficientEquity {
                    account,
                    vault,
                    available: entry.equity,
                    requested: usd,
                })?;
            Ok(())
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Staking
    // ═══════════════════════════════════════════════════════════════════════════

    /// Staking position of an account.
    pub fn delegator_summary(&self, account: &Address) -> DelegatorSummary {
        self.delegators.get(account).copied().unwrap_or_default()
    }

    /// Add to the undelegated staking balance.
    pub fn stake(&mut self, account: Address, wei: u64) -> Result<(), LedgerError> {
        update(&mut self.delegators, account, |summary| {
            summary.undelegating = summary
                .undelegating
                .checked_add(wei)
                .ok_or(LedgerError::Overflow)?;
            summary.nonce += 1;
            Ok(())
        })
    }

    /// Move undelegated stake into the unstaking cooldown.
    pub fn begin_unstake(&mut self, account: Address, wei: u64) -> Result<(), LedgerError> {
        update(&mut self.delegators, account, |summary| {
            let remaining = summary.undelegating.checked_sub(wei).ok_or(
                LedgerError::InsufficientStakingBalance {
                    account,
                    available: summary.undelegating,
                    requested: wei,
                },
            )?;
            let pending = summary
                .total_pending_withdrawal
                .checked_add(wei)
                .ok_or(LedgerError::Overflow)?;
            summary.undelegating = remaining;
            summary.total_pending_withdrawal = pending;
            summary.nonce += 1;
            Ok(())
        })
    }

    /// Remove a matured withdrawal from the cooldown total.
    pub fn finish_unstake(&mut self, account: Address, wei: u64) -> Result<(), LedgerError> {
        update(&mut self.delegators, account, |summary| {
            summary.total_pending_withdrawal = summary
                .total_pending_withdrawal
                .checked_sub(wei)
                .ok_or(LedgerError::InsufficientPendingWithdrawal {
                    account,
                    available: summary.total_pending_withdrawal,
                    requested: wei,
                })?;
            Ok(())
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Fixture overrides
    // ═══════════════════════════════════════════════════════════════════════════

    /// Overwrite a spot balance.
    pub fn force_spot(&mut self, account: Address, token: TokenId, wei: u64) {
        debug!(%account, %token, wei, "Forcing spot balance");
        self.balances.insert((account, DexId::SPOT, token), wei);
    }

    /// Overwrite a dex-partition balance.
    pub fn force_dex_balance(&mut self, account: Address, dex: DexId, token: TokenId, wei: u64) {
        debug!(%account, %dex, %token, wei, "Forcing dex balance");
        self.balances.insert((account, dex, token), wei);
    }

    /// Overwrite perp withdrawable.
    pub fn force_perp(&mut self, account: Address, withdrawable: u64) {
        debug!(%account, withdrawable, "Forcing perp withdrawable");
        self.perps
            .insert(account, PerpAccountState { withdrawable });
    }

    /// Overwrite vault equity and its lock.
    pub fn force_vault_equity(
        &mut self,
        account: Address,
        vault: VaultAddress,
        equity: u64,
        locked_until: Duration,
    ) {
        debug!(%account, %vault, equity, ?locked_until, "Forcing vault equity");
        self.vaults.insert(
            (account, vault),
            UserVaultEquity {
                equity,
                locked_until,
            },
        );
    }

    /// Overwrite the undelegated staking balance. The nonce is kept.
    pub fn force_staking(&mut self, account: Address, wei: u64) {
        debug!(%account, wei, "Forcing staking balance");
        let mut summary = self.delegator_summary(&account);
        summary.undelegating = wei;
        self.delegators.insert(account, summary);
    }

    /// Overwrite the delegated stake. The nonce is kept.
    pub fn force_delegation(&mut self, account: Address, delegated: u64) {
        debug!(%account, delegated, "Forcing delegation");
        let mut summary = self.delegator_summary(&account);
        summary.delegated = delegated;
        self.delegators.insert(account, summary);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Totals
    // ═══════════════════════════════════════════════════════════════════════════

    /// Sum of a token's balances over every account and partition.
    pub fn token_supply(&self, token: TokenId) -> u128 {
        self.balances
            .iter()
            .filter(|((_, _, t), _)| *t == token)
            .map(|(_, wei)| *wei as u128)
            .sum()
    }

    /// Sum of withdrawable over every account, 6 decimals.
    pub fn total_withdrawable(&self) -> u128 {
        self.perps.values().map(|p| p.withdrawable as u128).sum()
    }

    /// Sum of vault equity over every account and vault, 6 decimals.
    pub fn total_vault_equity(&self) -> u128 {
        self.vaults.values().map(|v| v.equity as u128).sum()
    }

    /// Sum of delegated, undelegated and pending stake over every account.
    pub fn total_staked(&self) -> u128 {
        self.delegators
            .values()
            .map(|s| s.delegated as u128 + s.undelegating as u128 + s.total_pending_withdrawal as u128)
            .sum()
    }
}
