//! Account management for simulations.
//!
//! Provides an `AccountPool` of deterministic addresses that are created
//! and funded before the first tick, plus a handful of addresses that are
//! never created so transfers to them exercise the drop path.

use crate::config::AccountDistribution;
use hypercore_types::Address;
use tracing::info;

/// Pool of simulated EVM accounts.
pub struct AccountPool {
    /// Created, funded accounts.
    accounts: Vec<Address>,

    /// Addresses that never get a Core account.
    uncreated: Vec<Address>,

    /// A vault address shared by every account.
    vault: Address,

    /// Round-robin counter (for RoundRobin mode).
    round_robin_counter: usize,

    /// Usage tracking: total selections per account index.
    usage_counts: Vec<u64>,
}

impl AccountPool {
    /// Derive `count` account addresses from `seed`.
    pub fn generate(count: usize, seed: u64) -> Result<Self, AccountPoolError> {
        if count < 2 {
            return Err(AccountPoolError::TooFewAccounts(count));
        }
        info!(count, seed, "Generating account pool");

        let accounts = (0..count as u64)
            .map(|i| derive_address(seed, b"account", i))
            .collect();
        let uncreated = (0..4).map(|i| derive_address(seed, b"uncreated", i)).collect();

        Ok(Self {
            accounts,
            uncreated,
            vault: derive_address(seed, b"vault", 0),
            round_robin_counter: 0,
            usage_counts: vec![0; count],
        })
    }

    /// Every created account, in generation order.
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// The shared vault.
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// Total number of created accounts.
    pub fn total_accounts(&self) -> usize {
        self.accounts.len()
    }

    /// Pick one sender.
    pub fn sender(
        &mut self,
        rng: &mut impl rand::Rng,
        distribution: AccountDistribution,
    ) -> Address {
        let idx = self.select_single_index(rng, distribution);
        self.record_usage(idx);
        self.accounts[idx]
    }

    /// Pick a distinct sender and destination.
    pub fn pair(
        &mut self,
        rng: &mut impl rand::Rng,
        distribution: AccountDistribution,
    ) -> (Address, Address) {
        let (idx1, idx2) = self.select_pair_indices(rng, distribution);
        self.record_usage(idx1);
        self.record_usage(idx2);
        (self.accounts[idx1], self.accounts[idx2])
    }

    /// A random address with no Core account.
    pub fn uncreated(&self, rng: &mut impl rand::Rng) -> Address {
        self.uncreated[rng.gen_range(0..self.uncreated.len())]
    }

    /// Select a pair of distinct account indices based on distribution mode.
    fn select_pair_indices(
        &mut self,
        rng: &mut impl rand::Rng,
        distribution: AccountDistribution,
    ) -> (usize, usize) {
        let n = self.accounts.len();
        match distribution {
            AccountDistribution::Random => {
                let idx1 = rng.gen_range(0..n);
                let mut idx2 = rng.gen_range(0..n);
                while idx2 == idx1 {
                    idx2 = rng.gen_range(0..n);
                }
                (idx1, idx2)
            }
            AccountDistribution::RoundRobin => {
                // Cycles through accounts sequentially: (0,1), (2,3), (4,5)...
                let counter = self.round_robin_counter;
                self.round_robin_counter += 1;
                let idx1 = (counter * 2) % n;
                let mut idx2 = (counter * 2 + 1) % n;
                if idx2 == idx1 {
                    idx2 = (idx1 + 1) % n;
                }
                (idx1, idx2)
            }
            AccountDistribution::Zipf { exponent } => {
                let idx1 = zipf_index(n, exponent, rng);
                let mut idx2 = zipf_index(n, exponent, rng);
                while idx2 == idx1 {
                    idx2 = rng.gen_range(0..n);
                }
                (idx1, idx2)
            }
        }
    }

    /// Select a single account index based on distribution mode.
    fn select_single_index(
        &mut self,
        rng: &mut impl rand::Rng,
        distribution: AccountDistribution,
    ) -> usize {
        let n = self.accounts.len();
        match distribution {
            AccountDistribution::Random => rng.gen_range(0..n),
            AccountDistribution::RoundRobin => {
                let idx = self.round_robin_counter % n;
                self.round_robin_counter += 1;
                idx
            }
            AccountDistribution::Zipf { exponent } => zipf_index(n, exponent, rng),
        }
    }

    fn record_usage(&mut self, idx: usize) {
        if let Some(counter) = self.usage_counts.get_mut(idx) {
            *counter += 1;
        }
    }

    /// Get usage statistics for analysis.
    pub fn usage_stats(&self) -> AccountUsageStats {
        let total_selections: u64 = self.usage_counts.iter().sum();
        let max_selections = self.usage_counts.iter().copied().max().unwrap_or(0);
        let min_selections = self
            .usage_counts
            .iter()
            .copied()
            .filter(|count| *count > 0)
            .min()
            .unwrap_or(0);
        let account_count = self.usage_counts.len();

        let avg_selections = if account_count > 0 {
            total_selections as f64 / account_count as f64
        } else {
            0.0
        };

        AccountUsageStats {
            total_selections,
            avg_selections,
            max_selections,
            min_selections,
            account_count,
        }
    }
}

/// Generate a Zipf-distributed index.
fn zipf_index(n: usize, exponent: u32, rng: &mut impl rand::Rng) -> usize {
    // Inverse transform approximation; higher exponent skews toward index 0.
    let exp = exponent.max(1) as f64;
    let u: f64 = rng.gen();
    let idx = ((n as f64).powf(1.0 - u)).powf(1.0 / exp) as usize;
    idx.saturating_sub(1).min(n - 1)
}

fn derive_address(seed: u64, domain: &[u8], index: u64) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    hasher.update(&seed.to_le_bytes());
    hasher.update(&index.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; Address::BYTES];
    bytes.copy_from_slice(&digest.as_bytes()[..Address::BYTES]);
    Address::from_bytes(bytes)
}

/// Statistics about account usage distribution.
#[derive(Clone, Debug)]
pub struct AccountUsageStats {
    /// Total number of account selections.
    pub total_selections: u64,
    /// Average selections per account.
    pub avg_selections: f64,
    /// Maximum selections for any account.
    pub max_selections: u64,
    /// Minimum selections for any account (excluding unused).
    pub min_selections: u64,
    /// Total number of accounts.
    pub account_count: usize,
}

impl AccountUsageStats {
    /// Calculate the skew ratio (max / avg). Higher = more uneven.
    pub fn skew_ratio(&self) -> f64 {
        if self.avg_selections > 0.0 {
            self.max_selections as f64 / self.avg_selections
        } else {
            0.0
        }
    }
}

/// Errors that can occur during account pool operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountPoolError {
    #[error("Need at least 2 accounts, got {0}")]
    TooFewAccounts(usize),
}
