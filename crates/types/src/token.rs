//! Spot token metadata and its registry.

use crate::{Address, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata for a spot token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Ticker, e.g. `USDC`.
    pub name: String,

    /// Decimals used for order sizes.
    pub sz_decimals: u8,

    /// Decimals of Core balances (`SpotBalance::total`).
    pub wei_decimals: u8,

    /// EVM-side decimals minus Core wei decimals. May be negative.
    pub evm_extra_wei_decimals: i8,

    /// Mirror contract on the EVM side, once deployed.
    #[serde(default)]
    pub evm_contract: Option<Address>,
}

impl TokenInfo {
    /// Create token metadata with no mirror contract.
    pub fn new(
        name: impl Into<String>,
        sz_decimals: u8,
        wei_decimals: u8,
        evm_extra_wei_decimals: i8,
    ) -> Self {
        Self {
            name: name.into(),
            sz_decimals,
            wei_decimals,
            evm_extra_wei_decimals,
            evm_contract: None,
        }
    }

    /// Decimals of the EVM-side representation.
    pub fn evm_decimals(&self) -> i16 {
        self.wei_decimals as i16 + self.evm_extra_wei_decimals as i16
    }
}

/// Register-once token registry.
///
/// Entries are immutable after registration, except that the mirror
/// contract may be assigned exactly once.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: BTreeMap<TokenId, TokenInfo>,
}

impl TokenRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token. Fails if the id is already taken.
    pub fn register(&mut self, token: TokenId, info: TokenInfo) -> Result<(), RegistryError> {
        if self.tokens.contains_key(&token) {
            return Err(RegistryError::AlreadyRegistered(token));
        }
        self.tokens.insert(token, info);
        Ok(())
    }

    /// Assign the EVM mirror contract of a registered token.
    pub fn deploy_mirror(&mut self, token: TokenId, contract: Address) -> Result<(), RegistryError> {
        let info = self
            .tokens
            .get_mut(&token)
            .ok_or(RegistryError::UnknownToken(token))?;
        if let Some(existing) = info.evm_contract {
            return Err(RegistryError::MirrorAlreadyDeployed { token, existing });
        }
        info.evm_contract = Some(contract);
        Ok(())
    }

    /// Look up a token.
    pub fn get(&self, token: TokenId) -> Option<&TokenInfo> {
        self.tokens.get(&token)
    }

    /// Look up a token, failing with [`RegistryError::UnknownToken`].
    pub fn require(&self, token: TokenId) -> Result<&TokenInfo, RegistryError> {
        self.get(token).ok_or(RegistryError::UnknownToken(token))
    }

    /// Check if a token is registered.
    pub fn contains(&self, token: TokenId) -> bool {
        self.tokens.contains_key(&token)
    }

    /// Iterate registered tokens in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &TokenInfo)> + '_ {
        self.tokens.iter().map(|(id, info)| (*id, info))
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Errors from the token registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} is already registered")]
    AlreadyRegistered(TokenId),

    #[error("{0} is not registered")]
    UnknownToken(TokenId),

    #[error("{token} already has a mirror contract at {existing}")]
    MirrorAlreadyDeployed { token: TokenId, existing: Address },
}
