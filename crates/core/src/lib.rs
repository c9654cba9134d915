//! Core types for the HyperCore settlement machine.
//!
//! Defines the [`StateMachine`] trait the ledger is driven through, the
//! inbound [`Event`]s and outbound [`Notification`]s, and the
//! [`ActionOutcome`] every queue entry ends in.

mod id;
mod message;
mod outcome;
mod traits;

pub use id::ActionId;
pub use message::{CreditTarget, Event, MirrorTransfer, Notification};
pub use outcome::{ActionOutcome, DropReason};
pub use traits::StateMachine;
