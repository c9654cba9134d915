//! Core traits for state machines.

use crate::{Event, Notification};
use std::time::Duration;

/// A state machine that processes events.
///
/// The ledger simulator is driven entirely through this interface:
///
/// - **Synchronous**: No async, no `.await`
/// - **Deterministic**: Same state + time + event = same notifications
/// - **Pure-ish**: Mutates self, but performs no I/O
///
/// Time never advances on its own. The runner supplies it through
/// [`StateMachine::set_time`] before each call to [`StateMachine::handle`],
/// which is what makes delayed settlement replayable.
///
/// # Example
///
/// ```ignore
/// core.set_time(Duration::from_secs(240));
/// for notification in core.handle(Event::FlushRequested) {
///     match notification {
///         Notification::MirrorTransfer(transfer) => mirror.on_transfer(transfer),
///         other => tracing::debug!(?other, "settled"),
///     }
/// }
/// ```
pub trait StateMachine {
    /// Process an event, returning notifications for the runner.
    ///
    /// # Guarantees
    ///
    /// - **Synchronous**: This method never blocks or awaits
    /// - **Deterministic**: Given the same state and event, always returns the same notifications
    /// - **No I/O**: Collaborators (e.g. the token mirror) are driven by the runner
    ///   from the returned notifications
    fn handle(&mut self, event: Event) -> Vec<Notification>;

    /// Set the current time.
    ///
    /// Called by the runner before each `handle()` call to provide the
    /// current simulated time.
    fn set_time(&mut self, now: Duration);

    /// Get the current time.
    ///
    /// Returns the time that was last set via `set_time()`.
    fn now(&self) -> Duration;
}
