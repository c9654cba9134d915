//! Queue entries.

use hypercore_actions::{Action, ActionKind, DecodeError};
use hypercore_core::{ActionId, ActionOutcome};
use hypercore_types::{Address, TokenId};
use std::time::Duration;

/// What was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Bytes sent to the core writer, decoded at enqueue.
    ///
    /// A decode failure is kept so the entry can be reported as dropped on
    /// the next flush instead of being rejected at submission.
    CoreAction(Result<Action, DecodeError>),

    /// A credit observed by the deposit bridge, in EVM-side units.
    BridgeDeposit { token: TokenId, evm_amount: u128 },
}

impl Submission {
    /// The decoded action kind, if this is a well-formed core action.
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Submission::CoreAction(Ok(action)) => Some(action.kind()),
            _ => None,
        }
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Submission::CoreAction(Ok(action)) => action.kind().name(),
            Submission::CoreAction(Err(_)) => "Malformed",
            Submission::BridgeDeposit { .. } => "BridgeDeposit",
        }
    }
}

/// Lifecycle of a queue entry. `Applied` and `Dropped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionStatus {
    #[default]
    Pending,
    Applied,
    Dropped,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ActionStatus::Pending)
    }
}

/// A submitted action waiting for its maturity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub id: ActionId,
    pub sender: Address,
    pub submission: Submission,
    pub enqueued_at: Duration,
    pub matures_at: Duration,
    pub status: ActionStatus,
}

impl PendingAction {
    /// Record the terminal state. Only the first call has an effect.
    pub fn settle(&mut self, outcome: &ActionOutcome) {
        if self.status.is_terminal() {
            return;
        }
        self.status = if outcome.is_applied() {
            ActionStatus::Applied
        } else {
            ActionStatus::Dropped
        };
    }

    /// Simulated time between enqueue and `now`.
    pub fn latency(&self, now: Duration) -> Duration {
        now.saturating_sub(self.enqueued_at)
    }
}
