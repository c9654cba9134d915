//! Domain-specific identifier types.

use crate::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spot token index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

/// Balance partition identifier.
///
/// Token balances are partitioned by dex. The spot partition uses the
/// all-ones index; perp dexes count up from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DexId(pub u32);

impl DexId {
    /// The spot partition.
    pub const SPOT: Self = DexId(u32::MAX);

    /// The first (default) perp dex.
    pub const DEFAULT_PERP: Self = DexId(0);

    /// Whether this is the spot partition.
    pub fn is_spot(self) -> bool {
        self == Self::SPOT
    }
}

impl fmt::Display for DexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_spot() {
            write!(f, "Dex(spot)")
        } else {
            write!(f, "Dex({})", self.0)
        }
    }
}

/// Vaults are identified by their leader-controlled address.
pub type VaultAddress = Address;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dex_display() {
        assert_eq!(DexId::SPOT.to_string(), "Dex(spot)");
        assert_eq!(DexId(3).to_string(), "Dex(3)");
        assert!(DexId::SPOT.is_spot());
        assert!(!DexId::DEFAULT_PERP.is_spot());
    }

    #[test]
    fn test_token_id_ordering() {
        let mut ids = vec![TokenId(150), TokenId(0), TokenId(7)];
        ids.sort();
        assert_eq!(ids, vec![TokenId(0), TokenId(7), TokenId(150)]);
    }
}
