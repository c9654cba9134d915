//! Settlement outcomes.
//!
//! Failures never cross the settlement boundary as errors: the submitting
//! transaction has already been committed elsewhere and cannot be reverted.
//! A failed action is instead recorded as [`ActionOutcome::Dropped`] with
//! the reason, and its effect on the ledger is nil.

use hypercore_actions::DecodeError;
use hypercore_ledger::LedgerError;
use hypercore_types::{Address, TokenId, VaultAddress};
use std::time::Duration;
use thiserror::Error;

/// Terminal state of a queued action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action's effect was applied.
    Applied,
    /// The action had no effect.
    Dropped(DropReason),
}

impl ActionOutcome {
    /// Check if the action was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }

    /// Get the drop reason, if any.
    pub fn drop_reason(&self) -> Option<&DropReason> {
        match self {
            ActionOutcome::Applied => None,
            ActionOutcome::Dropped(reason) => Some(reason),
        }
    }
}

impl From<Result<(), DropReason>> for ActionOutcome {
    fn from(result: Result<(), DropReason>) -> Self {
        match result {
            Ok(()) => ActionOutcome::Applied,
            Err(reason) => ActionOutcome::Dropped(reason),
        }
    }
}

/// Why an action had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("Malformed action: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Sender {0} has no Core account")]
    AccountNotCreated(Address),

    #[error("Destination {0} has no Core account")]
    DestinationNotCreated(Address),

    #[error("{0} is not registered")]
    UnknownToken(TokenId),

    #[error("{sub} is not a sub-account of {master}")]
    UnknownSubAccount { master: Address, sub: Address },

    #[error("Vault {vault} equity locked until {locked_until:?}")]
    VaultLocked {
        vault: VaultAddress,
        locked_until: Duration,
    },

    #[error("No equity in vault {vault}")]
    NoVaultEquity { vault: VaultAddress },

    #[error("Amount out of range after decimal conversion")]
    AmountOutOfRange,

    #[error("Amount {evm_amount} is not a whole number of Core units")]
    InexactAmount { evm_amount: u128 },
}

impl DropReason {
    /// Short, stable label for metrics and reports.
    pub fn label(&self) -> &'static str {
        match self {
            DropReason::Decode(_) => "decode",
            DropReason::Ledger(err) => err.label(),
            DropReason::AccountNotCreated(_) => "account_not_created",
            DropReason::DestinationNotCreated(_) => "destination_not_created",
            DropReason::UnknownToken(_) => "unknown_token",
            DropReason::UnknownSubAccount { .. } => "unknown_sub_account",
            DropReason::VaultLocked { .. } => "vault_locked",
            DropReason::NoVaultEquity { .. } => "no_vault_equity",
            DropReason::AmountOutOfRange => "amount_out_of_range",
            DropReason::InexactAmount { .. } => "inexact_amount",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_result() {
        assert!(ActionOutcome::from(Ok(())).is_applied());

        let dropped = ActionOutcome::from(Err(DropReason::AmountOutOfRange));
        assert!(!dropped.is_applied());
        assert_eq!(dropped.drop_reason(), Some(&DropReason::AmountOutOfRange));
    }

    #[test]
    fn test_decode_errors_convert() {
        let reason: DropReason = DecodeError::UnknownKind(9).into();
        assert_eq!(reason.label(), "decode");
        assert_eq!(reason.to_string(), "Malformed action: Unknown action kind 9");
    }
}
