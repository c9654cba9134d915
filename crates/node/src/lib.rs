//! The HyperCore ledger simulator.
//!
//! This crate composes the action queue, the timelock, the action processor
//! and the ledger store into [`HyperCore`], the single entry point used by
//! the EVM side: raw actions go in through [`HyperCore::enqueue`], settle on
//! [`HyperCore::flush_action_queue`], and are observed through the read
//! methods.
//!
//! [`SharedHyperCore`] wraps it for hosts that read from several threads
//! while one writer flushes.

mod config;
mod mirror;
mod shared;
mod state;

pub use config::HyperCoreConfig;
pub use mirror::{forward_mirror_transfers, RecordingMirror, TokenMirror};
pub use shared::SharedHyperCore;
pub use state::HyperCore;
