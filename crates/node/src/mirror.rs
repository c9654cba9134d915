//! The token mirror seam.
//!
//! Spot balance withdrawn to the EVM side leaves Core as a
//! [`MirrorTransfer`]. The mirror contract on the other side is an external
//! collaborator; the ledger only hands it the transfer.

use hypercore_core::{MirrorTransfer, Notification};
use tracing::trace;

/// Receives value leaving Core.
pub trait TokenMirror {
    fn on_transfer(&mut self, transfer: MirrorTransfer);
}

/// A mirror that keeps every transfer it was given.
#[derive(Debug, Default, Clone)]
pub struct RecordingMirror {
    transfers: Vec<MirrorTransfer>,
}

impl RecordingMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers received so far, in delivery order.
    pub fn transfers(&self) -> &[MirrorTransfer] {
        &self.transfers
    }

    /// Sum of EVM amounts released for a token.
    pub fn released(&self, token: hypercore_types::TokenId) -> u128 {
        self.transfers
            .iter()
            .filter(|t| t.token == token)
            .map(|t| t.evm_amount)
            .sum()
    }
}

impl TokenMirror for RecordingMirror {
    fn on_transfer(&mut self, transfer: MirrorTransfer) {
        self.transfers.push(transfer);
    }
}

/// Deliver every mirror transfer in `notifications`, in order.
///
/// Returns the number delivered.
pub fn forward_mirror_transfers<M: TokenMirror + ?Sized>(
    notifications: &[Notification],
    mirror: &mut M,
) -> usize {
    let mut delivered = 0;
    for notification in notifications {
        if let Notification::MirrorTransfer(transfer) = notification {
            trace!(?transfer, "Forwarding to token mirror");
            mirror.on_transfer(*transfer);
            delivered += 1;
        }
    }
    delivered
}
