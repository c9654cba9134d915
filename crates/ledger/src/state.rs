//! Per-account ledger records, in the shape reads return them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Spot holding of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpotBalance {
    /// Balance in the token's wei decimals.
    pub total: u64,
    /// Amount reserved by resting orders. Always zero here: there is no book.
    pub hold: u64,
    /// Entry notional. Always zero here.
    pub entry_ntl: u64,
}

impl SpotBalance {
    /// A balance with only `total` set.
    pub fn with_total(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }
}

/// Perp margin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerpAccountState {
    /// USD available to withdraw, 6 decimals.
    pub withdrawable: u64,
}

/// A user's stake in a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserVaultEquity {
    /// USD equity, 6 decimals.
    pub equity: u64,
    /// Withdrawals are rejected while simulated time is before this.
    pub locked_until: Duration,
}

impl UserVaultEquity {
    /// Check if the equity can leave the vault at `now`.
    pub fn is_unlocked(&self, now: Duration) -> bool {
        now >= self.locked_until
    }
}

/// A user's staking position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DelegatorSummary {
    /// Stake delegated to validators.
    pub delegated: u64,
    /// Staking balance not delegated to any validator.
    pub undelegating: u64,
    /// Sum of withdrawals still in the unstaking cooldown.
    pub total_pending_withdrawal: u64,
    /// Incremented on every staking mutation.
    pub nonce: u64,
}
