//! The action queue.
//!
//! Raw actions are decoded on arrival, stamped with a maturity by the
//! [`TimeLock`](hypercore_timelock::TimeLock), and held in submission order
//! until a flush takes them. A flush sees every matured entry once, in
//! enqueue order; immature entries stay behind without blocking later ones.

mod pending;
mod queue;

pub use pending::{ActionStatus, PendingAction, Submission};
pub use queue::ActionQueue;
