//! In-memory ledger store.
//!
//! Holds every balance Core keeps: spot (and other dex partitions), perp
//! withdrawable, vault equity and staking positions. The store is built on
//! persistent maps, so snapshots are O(1) and a multi-step mutation can be
//! staged in a [`LedgerOverlay`] and committed atomically.

mod error;
mod overlay;
mod state;
mod store;

pub use error::LedgerError;
pub use overlay::LedgerOverlay;
pub use state::{DelegatorSummary, PerpAccountState, SpotBalance, UserVaultEquity};
pub use store::{BalanceKey, LedgerStore};
