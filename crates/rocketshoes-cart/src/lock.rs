//! Per-product async locks.
//!
//! A mutation holds its product's lock from the first read of the cart to
//! the final publish, so two clicks on the same product run one after the
//! other while different products never wait on each other.

use rocketshoes_core::ProductId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `product_id`.
    pub(crate) async fn lock(&self, product_id: ProductId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop slots nobody holds or waits on
            locks.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(locks.entry(product_id).or_default())
        };

        slot.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(1).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_wait() {
        let locks = KeyedLocks::new();
        let _one = locks.lock(1).await;

        let two = tokio::time::timeout(Duration::from_millis(50), locks.lock(2)).await;
        assert!(two.is_ok());
    }

    #[tokio::test]
    async fn test_released_slots_are_pruned() {
        let locks = KeyedLocks::new();

        for id in 0..10 {
            drop(locks.lock(id).await);
        }

        let _last = locks.lock(100).await;
        assert_eq!(locks.len(), 1);
    }
}
