//! Error types for ledger mutations.

use hypercore_types::{Address, DexId, TokenId, VaultAddress};
use thiserror::Error;

/// A checked ledger mutation was rejected.
///
/// Rejected mutations leave the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Token balance in a dex partition is too small.
    #[error("Insufficient {token} balance in {dex} for {account}: have {available}, need {requested}")]
    InsufficientBalance {
        account: Address,
        dex: DexId,
        token: TokenId,
        available: u64,
        requested: u64,
    },

    /// Perp withdrawable is too small.
    #[error("Insufficient withdrawable for {account}: have {available}, need {requested}")]
    InsufficientWithdrawable {
        account: Address,
        available: u64,
        requested: u64,
    },

    /// Vault equity is too small.
    #[error("Insufficient equity in vault {vault} for {account}: have {available}, need {requested}")]
    InsufficientEquity {
        account: Address,
        vault: VaultAddress,
        available: u64,
        requested: u64,
    },

    /// Undelegated staking balance is too small.
    #[error("Insufficient staking balance for {account}: have {available}, need {requested}")]
    InsufficientStakingBalance {
        account: Address,
        available: u64,
        requested: u64,
    },

    /// Pending unstaking withdrawal is smaller than the amount released.
    #[error("Insufficient pending withdrawal for {account}: have {available}, need {requested}")]
    InsufficientPendingWithdrawal {
        account: Address,
        available: u64,
        requested: u64,
    },

    /// A credit would overflow the balance.
    #[error("Balance overflow")]
    Overflow,
}

impl LedgerError {
    /// Short, stable label for metrics and reports.
    pub fn label(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::InsufficientWithdrawable { .. } => "insufficient_withdrawable",
            LedgerError::InsufficientEquity { .. } => "insufficient_equity",
            LedgerError::InsufficientStakingBalance { .. } => "insufficient_staking_balance",
            LedgerError::InsufficientPendingWithdrawal { .. } => "insufficient_pending_withdrawal",
            LedgerError::Overflow => "overflow",
        }
    }
}
