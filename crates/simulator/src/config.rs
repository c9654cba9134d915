//! Configuration types for the simulator.

use hypercore_node::HyperCoreConfig;
use hypercore_types::{TokenId, TokenInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading a simulator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of created, funded accounts.
    pub accounts: usize,

    /// Whole USDC credited to each account at start.
    pub initial_usdc: u64,

    /// Whole HYPE credited to each account at start.
    pub initial_hype: u64,

    /// Whole USD of perp withdrawable per account at start.
    pub initial_withdrawable: u64,

    /// Simulated time between batches.
    #[serde(with = "secs")]
    pub tick_interval: Duration,

    /// Random seed for deterministic simulation.
    pub seed: u64,

    /// Workload configuration.
    pub workload: WorkloadConfig,

    /// Ledger configuration.
    pub core: HyperCoreConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            accounts: 50,
            initial_usdc: 10_000,
            initial_hype: 1_000,
            initial_withdrawable: 5_000,
            tick_interval: Duration::from_secs(2),
            seed: 12345,
            workload: WorkloadConfig::default(),
            core: HyperCoreConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Set the number of accounts.
    pub fn with_accounts(mut self, accounts: usize) -> Self {
        self.accounts = accounts;
        self
    }

    /// Set the workload configuration.
    pub fn with_workload(mut self, workload: WorkloadConfig) -> Self {
        self.workload = workload;
        self
    }

    /// Set the simulated time between batches.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Tokens deployed before the run: the USD token and the staking token.
    pub fn tokens(&self) -> Vec<(TokenId, TokenInfo)> {
        vec![
            (self.core.usd_token, TokenInfo::new("USDC", 8, 8, 0)),
            (self.core.staking_token, TokenInfo::new("HYPE", 2, 8, 10)),
        ]
    }
}

/// Account selection distribution mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum AccountDistribution {
    /// Pure random selection.
    #[default]
    Random,

    /// Cycle through accounts in order.
    RoundRobin,

    /// A few hot accounts send most actions.
    Zipf {
        /// Zipf exponent (1 = mild skew, 2+ = heavy skew toward hotspots).
        exponent: u32,
    },
}

/// Relative weights of each generated action type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadMix {
    pub spot_send: u32,
    pub evm_withdrawal: u32,
    pub bridge_deposit: u32,
    pub usd_class_transfer: u32,
    pub vault_deposit: u32,
    pub vault_withdrawal: u32,
    pub staking_deposit: u32,
    pub staking_withdraw: u32,
    pub cross_dex_send: u32,
    pub malformed: u32,
}

impl Default for WorkloadMix {
    fn default() -> Self {
        Self {
            spot_send: 30,
            evm_withdrawal: 5,
            bridge_deposit: 10,
            usd_class_transfer: 15,
            vault_deposit: 8,
            vault_withdrawal: 8,
            staking_deposit: 6,
            staking_withdraw: 6,
            cross_dex_send: 10,
            malformed: 2,
        }
    }
}

impl WorkloadMix {
    /// Only spot sends.
    pub fn spot_only() -> Self {
        Self {
            spot_send: 1,
            evm_withdrawal: 0,
            bridge_deposit: 0,
            usd_class_transfer: 0,
            vault_deposit: 0,
            vault_withdrawal: 0,
            staking_deposit: 0,
            staking_withdraw: 0,
            cross_dex_send: 0,
            malformed: 0,
        }
    }
}

/// Workload configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of actions generated per tick.
    pub batch_size: usize,

    /// Fraction of transfers sent to an account that was never created.
    pub uncreated_destination_ratio: f64,

    /// Account selection distribution mode.
    pub account_distribution: AccountDistribution,

    pub mix: WorkloadMix,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            uncreated_destination_ratio: 0.05,
            account_distribution: AccountDistribution::default(),
            mix: WorkloadMix::default(),
        }
    }
}

impl WorkloadConfig {
    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the action mix.
    pub fn with_mix(mut self, mix: WorkloadMix) -> Self {
        self.mix = mix;
        self
    }

    /// Set the fraction of transfers to uncreated accounts.
    pub fn with_uncreated_destination_ratio(mut self, ratio: f64) -> Self {
        self.uncreated_destination_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the account distribution mode.
    pub fn with_account_distribution(mut self, distribution: AccountDistribution) -> Self {
        self.account_distribution = distribution;
        self
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
