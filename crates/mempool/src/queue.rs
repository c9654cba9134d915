//! FIFO queue of submitted actions.

use crate::{ActionStatus, PendingAction, Submission};
use hypercore_actions::decode;
use hypercore_core::ActionId;
use hypercore_timelock::{DelayClass, TimeLock};
use hypercore_types::{Address, TokenId};
use indexmap::IndexMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Submitted actions in enqueue order.
///
/// Entries leave the queue only through [`take_matured`](Self::take_matured);
/// there is no cancellation.
#[derive(Debug, Default)]
pub struct ActionQueue {
    entries: IndexMap<ActionId, PendingAction>,
    next_id: ActionId,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and enqueue raw action bytes.
    ///
    /// Always succeeds. Malformed bytes are kept with their decode error and
    /// mature immediately, so the next flush reports them as dropped.
    pub fn enqueue(
        &mut self,
        sender: Address,
        raw: &[u8],
        now: Duration,
        timelock: &mut TimeLock,
    ) -> ActionId {
        let decoded = decode(raw);
        let class = match &decoded {
            Ok(action) => DelayClass::of(action),
            Err(error) => {
                warn!(%sender, %error, len = raw.len(), "Malformed action queued");
                DelayClass::Immediate
            }
        };
        self.push(sender, Submission::CoreAction(decoded), class, now, timelock)
    }

    /// Enqueue a credit from the deposit bridge.
    pub fn enqueue_bridge_deposit(
        &mut self,
        sender: Address,
        token: TokenId,
        evm_amount: u128,
        now: Duration,
        timelock: &mut TimeLock,
    ) -> ActionId {
        self.push(
            sender,
            Submission::BridgeDeposit { token, evm_amount },
            DelayClass::Immediate,
            now,
            timelock,
        )
    }

    fn push(
        &mut self,
        sender: Address,
        submission: Submission,
        class: DelayClass,
        now: Duration,
        timelock: &mut TimeLock,
    ) -> ActionId {
        let id = self.next_id;
        self.next_id = id.next();

        let matures_at = timelock.schedule_maturity(id, class, now);
        debug!(
            %id,
            %sender,
            kind = submission.label(),
            ?matures_at,
            queued = self.entries.len() + 1,
            "Action enqueued"
        );

        self.entries.insert(
            id,
            PendingAction {
                id,
                sender,
                submission,
                enqueued_at: now,
                matures_at,
                status: ActionStatus::Pending,
            },
        );
        id
    }

    /// Remove every entry matured at `now`, in enqueue order.
    ///
    /// Immature entries keep their relative order and stay queued.
    pub fn take_matured(&mut self, now: Duration, timelock: &TimeLock) -> Vec<PendingAction> {
        let (matured, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|(id, _)| timelock.is_matured(*id, now));
        self.entries = pending.into_iter().collect();

        if !matured.is_empty() {
            debug!(
                matured = matured.len(),
                remaining = self.entries.len(),
                ?now,
                "Took matured actions"
            );
        }
        matured.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Get a queued entry.
    pub fn get(&self, id: ActionId) -> Option<&PendingAction> {
        self.entries.get(&id)
    }

    /// Queued entries in enqueue order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingAction> {
        self.entries.values()
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
