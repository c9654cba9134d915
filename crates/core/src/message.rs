//! Inbound events and outbound notifications.

use crate::{ActionId, ActionOutcome};
use hypercore_types::{Address, TokenId};
use std::time::Duration;

/// Inbound events for the settlement state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Raw action bytes sent by an EVM account to the core writer.
    ActionSubmitted { sender: Address, raw: Vec<u8> },

    /// The deposit bridge observed tokens sent to a system address.
    ///
    /// `evm_amount` is in EVM-side units and is converted to Core wei when
    /// the credit settles.
    BridgeDeposit {
        sender: Address,
        token: TokenId,
        evm_amount: u128,
    },

    /// Apply every matured queue entry and deferred credit.
    FlushRequested,
}

impl Event {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::ActionSubmitted { .. } => "ActionSubmitted",
            Event::BridgeDeposit { .. } => "BridgeDeposit",
            Event::FlushRequested => "FlushRequested",
        }
    }
}

/// Balance that a released deferred credit landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditTarget {
    /// Perp withdrawable, USD 6 decimals.
    Withdrawable,
    /// Spot balance of a token, in wei.
    Spot(TokenId),
}

/// Spot balance leaving Core for the EVM side.
///
/// Delivered to the token mirror, which releases `evm_amount` of the
/// token's EVM representation to `recipient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorTransfer {
    pub recipient: Address,
    pub token: TokenId,
    pub evm_amount: u128,
}

/// Outbound notifications.
///
/// These describe what happened during event handling. The runner forwards
/// them to observers and collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    // ═══════════════════════════════════════════════════════════════════════
    // Queue
    // ═══════════════════════════════════════════════════════════════════════
    /// An action or bridge credit entered the queue.
    ActionQueued {
        id: ActionId,
        sender: Address,
        matures_at: Duration,
    },

    /// A queue entry reached a terminal state.
    ActionSettled { id: ActionId, outcome: ActionOutcome },

    // ═══════════════════════════════════════════════════════════════════════
    // Deferred effects
    // ═══════════════════════════════════════════════════════════════════════
    /// A delayed credit matured and was applied.
    CreditReleased {
        account: Address,
        target: CreditTarget,
        amount: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Collaborators
    // ═══════════════════════════════════════════════════════════════════════
    /// Value leaving Core towards the EVM token mirror.
    MirrorTransfer(MirrorTransfer),
}

impl Notification {
    /// Get a human-readable name for this notification type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Notification::ActionQueued { .. } => "ActionQueued",
            Notification::ActionSettled { .. } => "ActionSettled",
            Notification::CreditReleased { .. } => "CreditReleased",
            Notification::MirrorTransfer(_) => "MirrorTransfer",
        }
    }

    /// Check if this notification is addressed to the token mirror.
    pub fn is_mirror(&self) -> bool {
        matches!(self, Notification::MirrorTransfer(_))
    }
}
