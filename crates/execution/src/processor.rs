//! The action processor.

use crate::handlers::{apply_action, apply_bridge_deposit, Context, Effects};
use hypercore_core::{ActionOutcome, CreditTarget, DropReason, Notification};
use hypercore_ledger::LedgerStore;
use hypercore_mempool::{PendingAction, Submission};
use hypercore_timelock::{Deferred, DeferredEffect, TimeLock};
use hypercore_types::{DexId, TokenId, TokenRegistry};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of processing one queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub outcome: ActionOutcome,
    /// Mirror transfers emitted by the action, followed by its
    /// `ActionSettled`.
    pub notifications: Vec<Notification>,
}

/// Applies matured queue entries and released deferred effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionProcessor {
    usd_token: TokenId,
    staking_token: TokenId,
}

impl ActionProcessor {
    /// Create a processor for the given USD and staking tokens.
    pub fn new(usd_token: TokenId, staking_token: TokenId) -> Self {
        Self {
            usd_token,
            staking_token,
        }
    }

    pub fn usd_token(&self) -> TokenId {
        self.usd_token
    }

    pub fn staking_token(&self) -> TokenId {
        self.staking_token
    }

    /// Apply one matured entry.
    ///
    /// The ledger is only written if every check passes. Deferred effects
    /// are registered with the timelock after the ledger commit, and the
    /// entry's maturity is released either way.
    pub fn process(
        &self,
        ledger: &mut LedgerStore,
        timelock: &mut TimeLock,
        registry: &TokenRegistry,
        pending: &PendingAction,
        now: Duration,
    ) -> Processed {
        let ctx = Context {
            registry,
            settlement: *timelock.config(),
            usd_token: self.usd_token,
            staking_token: self.staking_token,
            sender: pending.sender,
            now,
        };

        let result = match &pending.submission {
            Submission::CoreAction(Ok(action)) => {
                ledger.transact(|staged| apply_action(staged, &ctx, action))
            }
            Submission::CoreAction(Err(error)) => Err(DropReason::Decode(error.clone())),
            Submission::BridgeDeposit { token, evm_amount } => {
                ledger.transact(|staged| apply_bridge_deposit(staged, &ctx, *token, *evm_amount))
            }
        };
        timelock.release(pending.id);

        let mut notifications = Vec::new();
        let outcome = match result {
            Ok(Effects { deferred, mirrored }) => {
                for effect in deferred {
                    timelock.defer(effect, now);
                }
                notifications.extend(mirrored.into_iter().map(Notification::MirrorTransfer));
                debug!(
                    id = %pending.id,
                    sender = %pending.sender,
                    kind = pending.submission.label(),
                    "Action applied"
                );
                ActionOutcome::Applied
            }
            Err(reason) => {
                if matches!(reason, DropReason::Decode(_)) {
                    warn!(id = %pending.id, sender = %pending.sender, %reason, "Malformed action dropped");
                } else {
                    debug!(
                        id = %pending.id,
                        sender = %pending.sender,
                        kind = pending.submission.label(),
                        reason = reason.label(),
                        "Action dropped: {reason}"
                    );
                }
                ActionOutcome::Dropped(reason)
            }
        };

        notifications.push(Notification::ActionSettled {
            id: pending.id,
            outcome: outcome.clone(),
        });
        Processed {
            outcome,
            notifications,
        }
    }

    /// Apply a matured deferred effect.
    ///
    /// Returns `None` if the credit could not be applied. The ledger is left
    /// unchanged in that case and the effect goes back to the timelock, so
    /// its value stays pending instead of being lost.
    pub fn release(
        &self,
        ledger: &mut LedgerStore,
        timelock: &mut TimeLock,
        deferred: Deferred,
    ) -> Option<Notification> {
        let staking_token = self.staking_token;
        let result = ledger.transact(|staged| match deferred.effect {
            DeferredEffect::WithdrawableCredit { account, usd } => staged
                .credit_withdrawable(account, usd)
                .map(|()| (account, CreditTarget::Withdrawable, usd)),
            DeferredEffect::StakingRelease { account, wei } => {
                staged.finish_unstake(account, wei)?;
                staged
                    .credit_balance(account, DexId::SPOT, staking_token, wei)
                    .map(|()| (account, CreditTarget::Spot(staking_token), wei))
            }
        });

        match result {
            Ok((account, target, amount)) => {
                debug!(%account, ?target, amount, id = deferred.id.0, "Deferred credit released");
                Some(Notification::CreditReleased {
                    account,
                    target,
                    amount,
                })
            }
            Err(error) => {
                warn!(?deferred, %error, "Deferred credit could not be applied; kept for retry");
                timelock.restore(deferred);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypercore_core::{ActionId, MirrorTransfer};
    use hypercore_ledger::LedgerError;
    use hypercore_mempool::ActionQueue;
    use hypercore_test_helpers::{self as fixtures, user, HYPE, USDC};
    use hypercore_timelock::SettlementConfig;
    use hypercore_types::{scale, Address};
    use tracing_test::traced_test;

    struct Harness {
        ledger: LedgerStore,
        timelock: TimeLock,
        registry: TokenRegistry,
        queue: ActionQueue,
        processor: ActionProcessor,
        now: Duration,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                ledger: fixtures::ledger_with_users(),
                timelock: TimeLock::new(SettlementConfig::default()),
                registry: fixtures::token_registry(),
                queue: ActionQueue::new(),
                processor: ActionProcessor::new(USDC, HYPE),
                now: Duration::from_secs(1_000),
            }
        }

        fn submit(&mut self, sender: Address, raw: Vec<u8>) -> ActionId {
            self.queue
                .enqueue(sender, &raw, self.now, &mut self.timelock)
        }

        /// Process every matured entry and return their outcomes.
        fn run(&mut self) -> Vec<Processed> {
            let matured = self.queue.take_matured(self.now, &self.timelock);
            matured
                .iter()
                .map(|pending| {
                    self.processor.process(
                        &mut self.ledger,
                        &mut self.timelock,
                        &self.registry,
                        pending,
                        self.now,
                    )
                })
                .collect()
        }

        fn run_one(&mut self, sender: Address, raw: Vec<u8>) -> ActionOutcome {
            self.submit(sender, raw);
            let mut processed = self.run();
            assert_eq!(processed.len(), 1);
            processed.remove(0).outcome
        }

        fn release_due(&mut self) -> Vec<Notification> {
            self.timelock
                .take_due(self.now)
                .into_iter()
                .filter_map(|deferred| {
                    self.processor
                        .release(&mut self.ledger, &mut self.timelock, deferred)
                })
                .collect()
        }

        fn usdc(&self, account: Address) -> u64 {
            self.ledger.spot_balance(&account, USDC).total
        }
    }

    #[traced_test]
    #[test]
    fn test_spot_send_moves_balance() {
        let mut h = Harness::new();
        h.ledger.force_spot(user(0), USDC, scale(10, 8));

        let outcome = h.run_one(user(0), fixtures::spot_send(user(1), USDC, scale(4, 8)));

        assert!(outcome.is_applied());
        assert_eq!(h.usdc(user(0)), scale(6, 8));
        assert_eq!(h.usdc(user(1)), scale(4, 8));
    }

    #[traced_test]
    #[test]
    fn test_spot_send_to_uncreated_destination_keeps_funds() {
        let mut h = Harness::new();
        h.ledger.force_spot(user(0), USDC, scale(10, 8));
        let stranger = Address::from_low_u64(0xdead);

        let outcome = h.run_one(user(0), fixtures::spot_send(stranger, USDC, scale(5, 8)));

        assert_eq!(
            outcome,
            ActionOutcome::Dropped(DropReason::DestinationNotCreated(stranger))
        );
        assert_eq!(h.usdc(user(0)), scale(10, 8));
        assert!(!h.ledger.has_spot_entry(&stranger, USDC));
    }

    #[traced_test]
    #[test]
    fn test_spot_send_insufficient_balance() {
        let mut h = Harness::new();
        h.ledger.force_spot(user(0), USDC, 5);

        let outcome = h.run_one(user(0), fixtures::spot_send(user(1), USDC, 6));

        assert!(matches!(
            outcome.drop_reason(),
            Some(DropReason::Ledger(LedgerError::InsufficientBalance {
                available: 5,
                requested: 6,
                ..
            }))
        ));
        assert_eq!(h.usdc(user(0)), 5);
        assert_eq!(h.usdc(user(1)), 0);
    }

    #[traced_test]
    #[test]
    fn test_spot_send_unknown_token() {
        let mut h = Harness::new();
        let outcome = h.run_one(user(0), fixtures::spot_send(user(1), TokenId(9), 1));
        assert_eq!(
            outcome,
            ActionOutcome::Dropped(DropReason::UnknownToken(TokenId(9)))
        );
    }

    #[traced_test]
    #[test]
    fn test_uncreated_sender_is_dropped() {
        let mut h = Harness::new();
        let ghost = Address::from_low_u64(0x9057);
        h.ledger.force_spot(ghost, USDC, 10);

        let outcome = h.run_one(ghost, fixtures::spot_send(user(1), USDC, 10));

        assert_eq!(outcome, ActionOutcome::Dropped(DropReason::AccountNotCreated(ghost)));
        assert_eq!(h.usdc(ghost), 10);
    }

    #[traced_test]
    #[test]
    fn test_spot_send_to_system_address_withdraws_to_evm() {
        let mut h = Harness::new();
        h.ledger.force_spot(user(0), HYPE, scale(3, 8));

        h.submit(
            user(0),
            fixtures::spot_send(Address::NATIVE_SYSTEM, HYPE, scale(1, 8)),
        );
        let processed = h.run().remove(0);

        assert!(processed.outcome.is_applied());
        assert_eq!(
            processed.notifications[0],
            Notification::MirrorTransfer(MirrorTransfer {
                recipient: user(0),
                token: HYPE,
                evm_amount: 10u128.pow(18),
            })
        );
        assert_eq!(h.ledger.spot_balance(&user(0), HYPE).total, scale(2, 8));
    }

    #[traced_test]
    #[test]
    fn test_usd_class_transfer_both_directions() {
        let mut h = Harness::new();
        h.ledger.force_spot(user(0), USDC, scale(10, 8));

        let to_perp = h.run_one(user(0), fixtures::usd_class_transfer(scale(6, 6), true));
        assert!(to_perp.is_applied());
        assert_eq!(h.usdc(user(0)), scale(4, 8));
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(6, 6));

        let to_spot = h.run_one(user(0), fixtures::usd_class_transfer(scale(2, 6), false));
        assert!(to_spot.is_applied());
        assert_eq!(h.usdc(user(0)), scale(6, 8));
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(4, 6));

        let overdraw = h.run_one(user(0), fixtures::usd_class_transfer(scale(5, 6), false));
        assert!(!overdraw.is_applied());
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(4, 6));
    }

    #[traced_test]
    #[test]
    fn test_vault_deposit_waits_for_maturity() {
        let mut h = Harness::new();
        h.ledger.force_perp(user(0), scale(10, 6));

        h.submit(user(0), fixtures::vault_transfer(fixtures::vault(), true, scale(6, 6)));
        assert!(h.run().is_empty());
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(10, 6));

        h.now += Duration::from_secs(240);
        let processed = h.run();
        assert!(processed[0].outcome.is_applied());
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(4, 6));

        let equity = h.ledger.vault_equity(&user(0), &fixtures::vault());
        assert_eq!(equity.equity, scale(6, 6));
        assert_eq!(equity.locked_until, h.now + Duration::from_secs(24 * 60 * 60));
    }

    #[traced_test]
    #[test]
    fn test_vault_deposit_checks_withdrawable_at_maturity() {
        let mut h = Harness::new();
        h.ledger.force_perp(user(0), scale(10, 6));
        h.submit(user(0), fixtures::vault_transfer(fixtures::vault(), true, scale(6, 6)));

        // Funds leave before the deposit matures.
        h.ledger.force_perp(user(0), scale(1, 6));
        h.now += Duration::from_secs(240);

        let processed = h.run();
        assert!(!processed[0].outcome.is_applied());
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(1, 6));
        assert_eq!(h.ledger.vault_equity(&user(0), &fixtures::vault()).equity, 0);
    }

    #[traced_test]
    #[test]
    fn test_locked_vault_withdrawal_is_dropped() {
        let mut h = Harness::new();
        let locked_until = h.now + Duration::from_secs(60);
        h.ledger
            .force_vault_equity(user(0), fixtures::vault(), scale(6, 6), locked_until);

        let outcome = h.run_one(user(0), fixtures::vault_transfer(fixtures::vault(), false, scale(6, 6)));

        assert_eq!(
            outcome,
            ActionOutcome::Dropped(DropReason::VaultLocked {
                vault: fixtures::vault(),
                locked_until,
            })
        );
        assert_eq!(h.ledger.vault_equity(&user(0), &fixtures::vault()).equity, scale(6, 6));
        assert_eq!(h.ledger.withdrawable(&user(0)), 0);
        assert_eq!(h.timelock.pending_effects().count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_vault_withdrawal_is_two_phase() {
        let mut h = Harness::new();
        h.ledger
            .force_vault_equity(user(0), fixtures::vault(), scale(6, 6), Duration::ZERO);

        let outcome = h.run_one(user(0), fixtures::vault_transfer(fixtures::vault(), false, scale(6, 6)));
        assert!(outcome.is_applied());
        assert_eq!(h.ledger.vault_equity(&user(0), &fixtures::vault()).equity, 0);
        assert_eq!(h.ledger.withdrawable(&user(0)), 0);

        h.now += Duration::from_secs(3);
        assert!(h.release_due().is_empty());

        h.now += Duration::from_secs(1);
        let released = h.release_due();
        assert_eq!(
            released,
            vec![Notification::CreditReleased {
                account: user(0),
                target: CreditTarget::Withdrawable,
                amount: scale(6, 6),
            }]
        );
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(6, 6));
    }

    #[traced_test]
    #[test]
    fn test_failed_release_stays_pending() {
        let mut h = Harness::new();
        h.ledger.force_perp(user(0), u64::MAX);
        h.ledger
            .force_vault_equity(user(0), fixtures::vault(), scale(6, 6), Duration::ZERO);

        let outcome = h.run_one(user(0), fixtures::vault_transfer(fixtures::vault(), false, scale(6, 6)));
        assert!(outcome.is_applied());

        // Crediting would overflow withdrawable.
        h.now += Duration::from_secs(4);
        assert!(h.release_due().is_empty());
        assert!(logs_contain("kept for retry"));
        assert_eq!(h.ledger.withdrawable(&user(0)), u64::MAX);
        assert_eq!(h.timelock.pending_withdrawable_credits(), scale(6, 6) as u128);

        // Once there is room the same credit goes through.
        h.ledger.force_perp(user(0), 0);
        h.now += Duration::from_secs(1);
        assert_eq!(h.release_due().len(), 1);
        assert_eq!(h.ledger.withdrawable(&user(0)), scale(6, 6));
        assert_eq!(h.timelock.pending_withdrawable_credits(), 0);
    }

    #[traced_test]
    #[test]
    fn test_vault_withdrawal_without_equity() {
        let mut h = Harness::new();
        let outcome = h.run_one(user(0), fixtures::vault_transfer(fixtures::vault(), false, 1));
        assert_eq!(
            outcome,
            ActionOutcome::Dropped(DropReason::NoVaultEquity {
                vault: fixtures::vault()
            })
        );
    }

    #[traced_test]
    #[test]
    fn test_staking_deposit_and_withdraw() {
        let mut h = Harness::new();
        h.ledger.force_spot(user(0), HYPE, scale(5, 8));

        assert!(h.run_one(user(0), fixtures::staking_deposit(scale(3, 8))).is_applied());
        let summary = h.ledger.delegator_summary(&user(0));
        assert_eq!(summary.undelegating, scale(3, 8));
        assert_eq!(summary.nonce, 1);
        assert_eq!(h.ledger.spot_balance(&user(0), HYPE).total, scale(2, 8));

        assert!(h.run_one(user(0), fixtures::staking_withdraw(scale(1, 8))).is_applied());
        let summary = h.ledger.delegator_summary(&user(0));
        assert_eq!(summary.undelegating, scale(2, 8));
        assert_eq!(summary.total_pending_withdrawal, scale(1, 8));
        assert_eq!(summary.nonce, 2);

        // Over-withdrawal leaves the nonce untouched.
        assert!(!h.run_one(user(0), fixtures::staking_withdraw(scale(9, 8))).is_applied());
        assert_eq!(h.ledger.delegator_summary(&user(0)).nonce, 2);

        h.now += h.timelock.config().unstaking_delay;
        let released = h.release_due();
        assert_eq!(released.len(), 1);
        assert_eq!(h.ledger.delegator_summary(&user(0)).total_pending_withdrawal, 0);
        assert_eq!(h.ledger.spot_balance(&user(0), HYPE).total, scale(3, 8));
    }

    #[traced_test]
    #[test]
    fn test_cross_dex_send_from_sub_account() {
        let mut h = Harness::new();
        let sub = Address::from_low_u64(0x5ab);
        h.ledger.register_sub_account(user(0), sub);
        h.ledger.force_dex_balance(sub, DexId::DEFAULT_PERP, USDC, 100);

        let outcome = h.run_one(
            user(0),
            fixtures::cross_dex_send(user(1), sub, (DexId::DEFAULT_PERP, DexId::SPOT), USDC, 40),
        );
        assert!(outcome.is_applied());
        assert_eq!(h.ledger.dex_balance(&sub, DexId::DEFAULT_PERP, USDC), 60);
        assert_eq!(h.usdc(user(1)), 40);

        // user(1) does not own the sub-account.
        let outcome = h.run_one(
            user(1),
            fixtures::cross_dex_send(user(0), sub, (DexId::DEFAULT_PERP, DexId::SPOT), USDC, 10),
        );
        assert_eq!(
            outcome,
            ActionOutcome::Dropped(DropReason::UnknownSubAccount {
                master: user(1),
                sub
            })
        );
        assert_eq!(h.ledger.dex_balance(&sub, DexId::DEFAULT_PERP, USDC), 60);
    }

    #[traced_test]
    #[test]
    fn test_malformed_action_is_dropped_without_effect() {
        let mut h = Harness::new();
        h.ledger.force_spot(user(0), USDC, 10);
        let before = h.usdc(user(0));

        let outcome = h.run_one(user(0), vec![1, 0, 0, 99]);

        assert_eq!(outcome.drop_reason().map(DropReason::label), Some("decode"));
        assert_eq!(h.usdc(user(0)), before);
        assert!(logs_contain("Malformed action dropped"));
    }

    #[traced_test]
    #[test]
    fn test_bridge_deposit_converts_evm_amount() {
        let mut h = Harness::new();
        let id = h
            .queue
            .enqueue_bridge_deposit(user(0), HYPE, 10u128.pow(18), h.now, &mut h.timelock);
        let processed = h.run();
        assert_eq!(processed.len(), 1);
        assert!(processed[0].outcome.is_applied());
        assert_eq!(h.ledger.spot_balance(&user(0), HYPE).total, scale(1, 8));
        assert_eq!(h.timelock.matures_at(id), None);
    }

    #[traced_test]
    #[test]
    fn test_bridge_deposit_with_dust_is_dropped() {
        let mut h = Harness::new();
        let evm_amount = 10u128.pow(18) + 1;
        h.queue
            .enqueue_bridge_deposit(user(0), HYPE, evm_amount, h.now, &mut h.timelock);
        let processed = h.run();
        assert_eq!(
            processed[0].outcome,
            ActionOutcome::Dropped(DropReason::InexactAmount { evm_amount })
        );
        assert_eq!(h.ledger.spot_balance(&user(0), HYPE).total, 0);
    }
}
