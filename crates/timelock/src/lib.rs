//! Delayed settlement scheduling.
//!
//! Core does not apply every action on the block it was sent in. Vault
//! deposits wait a few minutes, vault withdrawals credit withdrawable a
//! few seconds after the equity leaves, and unstaked tokens sit in a
//! cooldown. This crate tracks when each of those matures:
//!
//! ```text
//! enqueue ──► TimeLock.schedule_maturity(id, DelayClass) ──► matures_at
//!                                                              │
//! flush(now) ──► is_matured(id, now)? ──► processor ──► defer(effect)
//!                                                              │
//! flush(later) ──► take_due(later) ──► release deferred credits ◄┘
//! ```
//!
//! The scheduler is pure bookkeeping: it never touches balances.

mod config;
mod tracker;

pub use config::SettlementConfig;
pub use tracker::{DelayClass, Deferred, DeferredEffect, DeferredId, TimeLock};
