//! Maturity tracking for queued actions and deferred effects.
//!
//! Nothing here runs on a clock. Every maturity is an absolute simulated
//! timestamp, compared against the `now` the caller passes in, so the same
//! sequence of calls always yields the same result.

use crate::SettlementConfig;
use hypercore_actions::Action;
use hypercore_core::ActionId;
use hypercore_types::Address;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// How long a queued entry waits before it may be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayClass {
    /// Processed by the first flush that sees it.
    Immediate,
    /// Waits `vault_deposit_delay`.
    VaultDeposit,
}

impl DelayClass {
    /// Delay class of a decoded action.
    ///
    /// Vault withdrawals are immediate at the queue level; their second
    /// phase is a deferred effect.
    pub fn of(action: &Action) -> Self {
        if action.is_vault_deposit() {
            DelayClass::VaultDeposit
        } else {
            DelayClass::Immediate
        }
    }

    fn delay(self, config: &SettlementConfig) -> Duration {
        match self {
            DelayClass::Immediate => Duration::ZERO,
            DelayClass::VaultDeposit => config.vault_deposit_delay,
        }
    }
}

/// Identifier of a deferred effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeferredId(pub u64);

/// Continuation of an already-applied action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredEffect {
    /// Second phase of a vault withdrawal: USD (6 decimals) to withdrawable.
    WithdrawableCredit { account: Address, usd: u64 },

    /// End of the unstaking cooldown: stake returns to the spot balance.
    StakingRelease { account: Address, wei: u64 },
}

impl DeferredEffect {
    fn delay(&self, config: &SettlementConfig) -> Duration {
        match self {
            DeferredEffect::WithdrawableCredit { .. } => config.vault_withdrawal_delay,
            DeferredEffect::StakingRelease { .. } => config.unstaking_delay,
        }
    }

    /// Account the effect credits.
    pub fn account(&self) -> Address {
        match self {
            DeferredEffect::WithdrawableCredit { account, .. }
            | DeferredEffect::StakingRelease { account, .. } => *account,
        }
    }
}

/// A scheduled continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    pub id: DeferredId,
    pub matures_at: Duration,
    pub effect: DeferredEffect,
}

/// Tracks when queued actions and deferred effects mature.
///
/// Two independent schedules are kept:
///
/// 1. **Action maturities**: `ActionId -> maturesAt`, registered at enqueue
///    and forgotten once the action reaches a terminal state.
/// 2. **Deferred effects**: continuations registered by the processor,
///    ordered by `(maturesAt, registration order)` and handed back once due.
#[derive(Debug, Default)]
pub struct TimeLock {
    config: SettlementConfig,

    /// action id -> maturity timestamp
    maturities: BTreeMap<ActionId, Duration>,

    /// (matures_at, id) -> effect
    deferred: BTreeMap<(Duration, DeferredId), DeferredEffect>,

    next_deferred: u64,
}

impl TimeLock {
    /// Create a scheduler with the given delays.
    pub fn new(config: SettlementConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// The delays in effect.
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Action maturities
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a queued action and return its maturity timestamp.
    pub fn schedule_maturity(
        &mut self,
        id: ActionId,
        class: DelayClass,
        enqueued_at: Duration,
    ) -> Duration {
        let matures_at = enqueued_at.saturating_add(class.delay(&self.config));
        self.maturities.insert(id, matures_at);
        trace!(%id, ?class, ?matures_at, "Scheduled action maturity");
        matures_at
    }

    /// Check if a registered action may be processed at `now`.
    ///
    /// Unknown ids are never matured.
    pub fn is_matured(&self, id: ActionId, now: Duration) -> bool {
        self.maturities
            .get(&id)
            .is_some_and(|matures_at| *matures_at <= now)
    }

    /// Maturity timestamp of a registered action.
    pub fn matures_at(&self, id: ActionId) -> Option<Duration> {
        self.maturities.get(&id).copied()
    }

    /// Forget an action that reached a terminal state.
    pub fn release(&mut self, id: ActionId) {
        self.maturities.remove(&id);
    }

    /// Number of actions with a registered maturity.
    pub fn scheduled_actions(&self) -> usize {
        self.maturities.len()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Deferred effects
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a continuation that matures after its configured delay.
    pub fn defer(&mut self, effect: DeferredEffect, now: Duration) -> Deferred {
        let id = DeferredId(self.next_deferred);
        self.next_deferred += 1;

        let matures_at = now.saturating_add(effect.delay(&self.config));
        self.deferred.insert((matures_at, id), effect);
        debug!(?effect, ?matures_at, "Deferred effect scheduled");

        Deferred {
            id,
            matures_at,
            effect,
        }
    }

    /// Remove and return every effect due at `now`, oldest maturity first.
    pub fn take_due(&mut self, now: Duration) -> Vec<Deferred> {
        let still_pending = match now.checked_add(Duration::from_nanos(1)) {
            Some(bound) => self.deferred.split_off(&(bound, DeferredId(0))),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.deferred, still_pending);

        due.into_iter()
            .map(|((matures_at, id), effect)| Deferred {
                id,
                matures_at,
                effect,
            })
            .collect()
    }

    /// Put back an effect taken by [`take_due`](Self::take_due) that could not
    /// be applied. It keeps its maturity and is due again on the next call.
    pub fn restore(&mut self, deferred: Deferred) {
        debug!(?deferred, "Deferred effect restored");
        self.deferred
            .insert((deferred.matures_at, deferred.id), deferred.effect);
    }

    /// Effects still waiting, in maturity order.
    pub fn pending_effects(&self) -> impl Iterator<Item = Deferred> + '_ {
        self.deferred
            .iter()
            .map(|((matures_at, id), effect)| Deferred {
                id: *id,
                matures_at: *matures_at,
                effect: *effect,
            })
    }

    /// USD (6 decimals) owed to withdrawable by pending vault withdrawals.
    pub fn pending_withdrawable_credits(&self) -> u128 {
        self.deferred
            .values()
            .map(|effect| match effect {
                DeferredEffect::WithdrawableCredit { usd, .. } => *usd as u128,
                DeferredEffect::StakingRelease { .. } => 0,
            })
            .sum()
    }
}
