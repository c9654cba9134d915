//! Single-writer, many-reader handle.

use crate::{forward_mirror_transfers, HyperCore, TokenMirror};
use hypercore_core::{ActionId, ActionOutcome, Notification};
use hypercore_ledger::LedgerStore;
use hypercore_types::Address;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// A [`HyperCore`] shared between a flushing writer and concurrent readers.
///
/// A flush holds the write lock for its whole duration, so a reader sees
/// either the state before the flush or after it. Long-lived readers can
/// take a [`snapshot`](Self::snapshot) of the ledger instead of holding the
/// lock.
#[derive(Debug, Clone)]
pub struct SharedHyperCore {
    inner: Arc<RwLock<HyperCore>>,
}

impl SharedHyperCore {
    pub fn new(core: HyperCore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(core)),
        }
    }

    pub fn enqueue(&self, sender: Address, raw: &[u8], now: Duration) -> ActionId {
        self.inner.write().enqueue(sender, raw, now)
    }

    pub fn flush_action_queue(&self, now: Duration) -> Vec<(ActionId, ActionOutcome)> {
        self.inner.write().flush_action_queue(now)
    }

    /// Flush and hand every mirror transfer to `mirror`.
    ///
    /// The mirror is driven after the lock is released.
    pub fn flush_into<M: TokenMirror + ?Sized>(
        &self,
        now: Duration,
        mirror: &mut M,
    ) -> Vec<Notification> {
        let notifications = self.inner.write().flush(now);
        forward_mirror_transfers(&notifications, mirror);
        notifications
    }

    /// O(1) copy of the committed ledger.
    pub fn snapshot(&self) -> LedgerStore {
        self.inner.read().ledger().clone()
    }

    /// Run `f` with shared access.
    pub fn read<T>(&self, f: impl FnOnce(&HyperCore) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access.
    pub fn write<T>(&self, f: impl FnOnce(&mut HyperCore) -> T) -> T {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HyperCoreConfig, RecordingMirror};
    use hypercore_test_helpers::{self as fixtures, user, HYPE};
    use hypercore_types::{scale, DexId};
    use std::thread;

    fn shared() -> SharedHyperCore {
        let mut core =
            HyperCore::with_registry(HyperCoreConfig::default(), fixtures::token_registry());
        core.force_account_creation(user(0));
        core.force_account_creation(user(1));
        SharedHyperCore::new(core)
    }

    #[test]
    fn test_snapshot_is_stable_across_flush() {
        let core = shared();
        core.write(|c| c.force_spot_balance(user(0), HYPE, 10));
        let before = core.snapshot();

        core.enqueue(user(0), &fixtures::spot_send(user(1), HYPE, 10), Duration::ZERO);
        core.flush_action_queue(Duration::ZERO);

        assert_eq!(before.spot_balance(&user(0), HYPE).total, 10);
        assert_eq!(core.read(|c| c.read_spot_balance(&user(0), HYPE).total), 0);
    }

    #[test]
    fn test_readers_never_see_partial_flush() {
        let core = shared();
        core.write(|c| {
            c.force_spot_balance(user(0), HYPE, 1_000);
            for _ in 0..100 {
                c.enqueue(user(0), &fixtures::spot_send(user(1), HYPE, 10), Duration::ZERO);
            }
        });

        let reader = {
            let core = core.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let total = core.read(|c| {
                        c.read_dex_balance(&user(0), DexId::SPOT, HYPE)
                            + c.read_dex_balance(&user(1), DexId::SPOT, HYPE)
                    });
                    let moved = core.read(|c| c.read_spot_balance(&user(1), HYPE).total);
                    assert_eq!(total, 1_000);
                    assert!(moved == 0 || moved == 1_000);
                }
            })
        };

        core.flush_action_queue(Duration::ZERO);
        reader.join().unwrap();
    }

    #[test]
    fn test_flush_into_drives_mirror() {
        let core = shared();
        core.write(|c| c.force_spot_balance(user(0), HYPE, scale(2, 8)));
        core.enqueue(
            user(0),
            &fixtures::spot_send(hypercore_types::Address::NATIVE_SYSTEM, HYPE, scale(1, 8)),
            Duration::ZERO,
        );

        let mut mirror = RecordingMirror::new();
        core.flush_into(Duration::ZERO, &mut mirror);
        assert_eq!(mirror.released(HYPE), 10u128.pow(18));
    }
}
