//! Deterministic action processor.
//!
//! Takes matured queue entries one at a time and applies them to the
//! ledger. Each entry either applies completely or is dropped with no
//! effect at all: validation and mutation run inside a ledger transaction
//! that only commits on success.
//!
//! Effects that settle later (the withdrawable credit of a vault
//! withdrawal, the end of an unstaking cooldown) are handed to the
//! [`TimeLock`](hypercore_timelock::TimeLock) once the first phase has
//! committed, and applied by [`ActionProcessor::release`] when due.

mod handlers;
mod processor;

pub use processor::{ActionProcessor, Processed};
