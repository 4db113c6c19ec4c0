use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::item::ItemId;

/// Items currently being processed. A pass must own its item's entry.
#[derive(Debug, Default)]
pub struct ItemLocks {
    in_flight: Mutex<HashSet<ItemId>>,
}

/// Releases the item when dropped.
#[derive(Debug)]
pub struct ItemGuard<'a> {
    locks: &'a ItemLocks,
    id: ItemId,
}

impl ItemLocks {
    /// `None` when another pass already holds `id`.
    pub fn try_acquire(&self, id: &ItemId) -> Option<ItemGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(id.clone()) {
            return None;
        }
        Some(ItemGuard {
            locks: self,
            id: id.clone(),
        })
    }
}

impl Drop for ItemGuard<'_> {
    fn drop(&mut self) {
        self.locks
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::ItemLocks;
    use crate::item::ItemId;
    use std::thread;

    #[test]
    fn try_acquire__same_item_twice() {
        let locks = ItemLocks::default();
        let id = ItemId::from("rent");

        let guard = locks.try_acquire(&id);
        assert!(guard.is_some());
        assert!(locks.try_acquire(&id).is_none());
    }

    #[test]
    fn try_acquire__released_on_drop() {
        let locks = ItemLocks::default();
        let id = ItemId::from("rent");

        drop(locks.try_acquire(&id));
        assert!(locks.try_acquire(&id).is_some());
    }

    #[test]
    fn try_acquire__different_items() {
        let locks = ItemLocks::default();
        let _rent = locks.try_acquire(&ItemId::from("rent")).unwrap();
        assert!(locks.try_acquire(&ItemId::from("salary")).is_some());
    }

    #[test]
    fn try_acquire__concurrent_passes_on_one_item() {
        let locks = ItemLocks::default();
        let id = ItemId::from("rent");

        let _held = locks.try_acquire(&id).unwrap();
        let acquired = thread::scope(|scope| {
            (0..4)
                .map(|_| scope.spawn(|| locks.try_acquire(&id).is_some()))
                .collect::<Vec<_>>()
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|acquired| *acquired)
                .count()
        });
        assert_eq!(acquired, 0);
    }
}
