//! Core types for the HyperCore ledger simulator.
//!
//! Addresses, identifiers, token metadata and the fixed-point helpers shared
//! by every other crate in the workspace.

mod address;
pub mod amount;
mod identifiers;
mod token;

pub use address::{Address, AddressError};
pub use amount::{evm_to_wei, rescale, scale, wei_to_evm, PERP_USD_DECIMALS};
pub use identifiers::{DexId, TokenId, VaultAddress};
pub use token::{RegistryError, TokenInfo, TokenRegistry};
