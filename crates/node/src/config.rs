//! Simulator configuration.

use hypercore_timelock::SettlementConfig;
use hypercore_types::TokenId;
use serde::{Deserialize, Serialize};

/// Configuration of a [`HyperCore`](crate::HyperCore) instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperCoreConfig {
    /// Settlement delays.
    pub settlement: SettlementConfig,

    /// Spot token moved by USD class transfers.
    pub usd_token: TokenId,

    /// Token staked by staking actions and bridged natively.
    pub staking_token: TokenId,
}

impl Default for HyperCoreConfig {
    fn default() -> Self {
        Self {
            settlement: SettlementConfig::default(),
            usd_token: TokenId(0),
            staking_token: TokenId(150),
        }
    }
}

impl HyperCoreConfig {
    pub fn with_settlement(mut self, settlement: SettlementConfig) -> Self {
        self.settlement = settlement;
        self
    }

    pub fn with_usd_token(mut self, token: TokenId) -> Self {
        self.usd_token = token;
        self
    }

    pub fn with_staking_token(mut self, token: TokenId) -> Self {
        self.staking_token = token;
        self
    }
}
