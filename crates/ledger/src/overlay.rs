//! Staged ledger writes.
//!
//! This module provides `LedgerOverlay`, which wraps a base store and
//! captures all writes without modifying it until `commit()`. This is how a
//! multi-step action (debit here, credit there) becomes all-or-nothing: the
//! steps run against the overlay, and the base only changes if every step
//! succeeded.

use crate::LedgerStore;
use std::ops::{Deref, DerefMut};

/// An overlay that captures writes without modifying the underlying store.
///
/// Reads and writes go to a staged snapshot of the base. Writes are
/// discarded when the overlay is dropped, or published with `commit()`.
///
/// # Example
///
/// ```ignore
/// let mut overlay = LedgerOverlay::new(&mut store);
/// overlay.debit_withdrawable(account, usd)?;
/// overlay.credit_vault_equity(account, vault, usd, locked_until)?;
/// overlay.commit();
/// ```
pub struct LedgerOverlay<'a> {
    /// The store that receives the writes on commit.
    base: &'a mut LedgerStore,

    /// Snapshot of the base with the overlay's writes applied.
    staged: LedgerStore,
}

impl<'a> LedgerOverlay<'a> {
    /// Create a new overlay wrapping the given base store.
    pub fn new(base: &'a mut LedgerStore) -> Self {
        let staged = base.clone();
        Self { base, staged }
    }

    /// Publish the staged writes to the base store.
    pub fn commit(self) {
        let Self { base, staged } = self;
        *base = staged;
    }
}

impl Deref for LedgerOverlay<'_> {
    type Target = LedgerStore;

    fn deref(&self) -> &LedgerStore {
        &self.staged
    }
}

impl DerefMut for LedgerOverlay<'_> {
    fn deref_mut(&mut self) -> &mut LedgerStore {
        &mut self.staged
    }
}

impl LedgerStore {
    /// Run `f` against an overlay, committing only if it returns `Ok`.
    pub fn transact<T, E>(
        &mut self,
        f: impl FnOnce(&mut LedgerStore) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut overlay = LedgerOverlay::new(self);
        let out = f(&mut *overlay)?;
        overlay.commit();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedgerError;
    use hypercore_types::{Address, DexId, TokenId};

    #[test]
    fn test_dropped_overlay_discards_writes() {
        let account = Address::from_low_u64(1);
        let mut store = LedgerStore::new();
        store.force_perp(account, 10);

        {
            let mut overlay = LedgerOverlay::new(&mut store);
            overlay.debit_withdrawable(account, 10).unwrap();
            assert_eq!(overlay.withdrawable(&account), 0);
        }

        assert_eq!(store.withdrawable(&account), 10);
    }

    #[test]
    fn test_transact_is_all_or_nothing() {
        let account = Address::from_low_u64(1);
        let mut store = LedgerStore::new();
        store.force_perp(account, 10);

        // First step succeeds, second fails: nothing is kept.
        let result: Result<(), LedgerError> = store.transact(|tx| {
            tx.debit_withdrawable(account, 6)?;
            tx.debit_balance(account, DexId::SPOT, TokenId(0), 1)
        });
        assert!(result.is_err());
        assert_eq!(store.withdrawable(&account), 10);

        store
            .transact(|tx| -> Result<(), LedgerError> {
                tx.debit_withdrawable(account, 6)?;
                tx.credit_balance(account, DexId::SPOT, TokenId(0), 6)
            })
            .unwrap();
        assert_eq!(store.withdrawable(&account), 4);
        assert_eq!(store.spot_balance(&account, TokenId(0)).total, 6);
    }
}
