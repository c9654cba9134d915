//! Configuration for settlement delays.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settlement cadences of the different Core subsystems.
///
/// The defaults are the compressed intervals the simulator is tested with.
/// Durations are written as whole seconds in serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Delay before a queued vault deposit moves funds into the vault.
    #[serde(with = "secs")]
    pub vault_deposit_delay: Duration,

    /// Delay between equity leaving a vault and the withdrawable credit.
    #[serde(with = "secs")]
    pub vault_withdrawal_delay: Duration,

    /// How long deposited equity stays locked in the vault.
    #[serde(with = "secs")]
    pub vault_lockup: Duration,

    /// Unstaking cooldown before a staking withdrawal returns to spot.
    #[serde(with = "secs")]
    pub unstaking_delay: Duration,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            vault_deposit_delay: Duration::from_secs(4 * 60),
            vault_withdrawal_delay: Duration::from_secs(4),
            vault_lockup: Duration::from_secs(24 * 60 * 60),
            unstaking_delay: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

impl SettlementConfig {
    /// A config where every effect settles on the next flush.
    pub fn instant() -> Self {
        Self {
            vault_deposit_delay: Duration::ZERO,
            vault_withdrawal_delay: Duration::ZERO,
            vault_lockup: Duration::ZERO,
            unstaking_delay: Duration::ZERO,
        }
    }

    /// Set the vault deposit settlement delay.
    pub fn with_vault_deposit_delay(mut self, delay: Duration) -> Self {
        self.vault_deposit_delay = delay;
        self
    }

    /// Set the vault withdrawal credit delay.
    pub fn with_vault_withdrawal_delay(mut self, delay: Duration) -> Self {
        self.vault_withdrawal_delay = delay;
        self
    }

    /// Set the vault lockup.
    pub fn with_vault_lockup(mut self, lockup: Duration) -> Self {
        self.vault_lockup = lockup;
        self
    }

    /// Set the unstaking cooldown.
    pub fn with_unstaking_delay(mut self, delay: Duration) -> Self {
        self.unstaking_delay = delay;
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
