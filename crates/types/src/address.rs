//! 20-byte account address.

use crate::TokenId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An account identifier, stable across every sub-ledger.
///
/// Addresses are plain 20-byte values. A handful of them are reserved as
/// system addresses: transfers sent to them are bridged between Core and the
/// EVM side rather than credited to an account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Size of an address in bytes.
    pub const BYTES: usize = 20;

    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// System address of the native gas token.
    pub const NATIVE_SYSTEM: Self = Self([0x22u8; 20]);

    /// Address of the contract that submits raw actions into Core.
    pub const CORE_WRITER: Self = Self([0x33u8; 20]);

    /// First byte shared by every per-token system address.
    const SYSTEM_PREFIX: u8 = 0x20;

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create an address whose low 8 bytes hold `value` (big-endian).
    ///
    /// Handy for vault ids like `0x…0123` in fixtures.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// System address for a spot token: `0x20` followed by zeros with the
    /// token index in the low 8 bytes.
    pub fn system_for_token(token: TokenId) -> Self {
        let mut addr = Self::from_low_u64(token.0);
        addr.0[0] = Self::SYSTEM_PREFIX;
        addr
    }

    /// Token index encoded in a per-token system address.
    pub fn system_token(&self) -> Option<TokenId> {
        if self.0[0] != Self::SYSTEM_PREFIX || self.0[1..12].iter().any(|&b| b != 0) {
            return None;
        }
        let low: [u8; 8] = self.0[12..].try_into().ok()?;
        Some(TokenId(u64::from_be_bytes(low)))
    }

    /// Whether this is any kind of system address.
    pub fn is_system(&self) -> bool {
        *self == Self::NATIVE_SYSTEM || self.system_token().is_some()
    }

    /// Parse from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != Self::BYTES * 2 {
            return Err(AddressError::InvalidLength {
                expected: Self::BYTES * 2,
                actual: digits.len(),
            });
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Get bytes as slice reference.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(f, "Address(0x{}..{})", &hex[..6], &hex[34..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Invalid hex string length.
    #[error("Invalid address length: expected {expected} hex digits, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid hex characters.
    #[error("Invalid hex string")]
    InvalidHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parse_and_display() {
        let addr = Address::from_hex("0x0000000000000000000000000000000000000123").unwrap();
        assert_eq!(addr, Address::from_low_u64(0x123));
        assert_eq!(addr.to_string(), "0x0000000000000000000000000000000000000123");

        let no_prefix: Address = "2222222222222222222222222222222222222222".parse().unwrap();
        assert_eq!(no_prefix, Address::NATIVE_SYSTEM);
    }

    #[test]
    fn test_hex_errors() {
        assert_eq!(
            Address::from_hex("0x1234"),
            Err(AddressError::InvalidLength {
                expected: 40,
                actual: 4
            })
        );
        assert_eq!(
            Address::from_hex("0xzz00000000000000000000000000000000000000"),
            Err(AddressError::InvalidHex)
        );
    }

    #[test]
    fn test_system_addresses() {
        let usdc = Address::system_for_token(TokenId(0));
        assert_eq!(usdc.to_hex(), "0x2000000000000000000000000000000000000000");
        assert_eq!(usdc.system_token(), Some(TokenId(0)));

        let other = Address::system_for_token(TokenId(150));
        assert_eq!(other.to_hex(), "0x2000000000000000000000000000000000000096");
        assert!(other.is_system());

        assert!(Address::NATIVE_SYSTEM.is_system());
        assert!(!Address::from_low_u64(7).is_system());
        assert!(!Address::CORE_WRITER.is_system());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = Address::from_low_u64(0xabc);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x0000000000000000000000000000000000000abc\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
