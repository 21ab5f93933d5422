//! The cart store: the only writer of persisted cart state.
//!
//! Every operation reads the cart fresh from storage, so independently
//! rendered regions (or tabs) sharing one store always see the latest write.
//! Concurrent toggles are not locked against each other: the last writer wins.

use thiserror::Error;

use storefront_core::{Entity, Product};

use crate::cart::{Cart, CartLineItem, ToggleOutcome};
use crate::notify::{Notice, Notifier};
use crate::storage::{CART_KEY, KeyValueStore, StorageError};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to encode cart: {0}")]
    Encode(String),
}

/// Result of a toggle, for rendering feedback without re-reading storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    pub outcome: ToggleOutcome,
    pub item: CartLineItem,
}

pub struct CartStore<S, N> {
    storage: S,
    notifier: N,
}

impl<S, N> CartStore<S, N>
where
    S: KeyValueStore,
    N: Notifier,
{
    pub fn new(storage: S, notifier: N) -> Self {
        let store = Self { storage, notifier };
        tracing::debug!(items = store.load().len(), "cart store opened");
        store
    }

    /// Read the persisted cart. Missing, unreadable or corrupt state is an empty cart.
    fn load(&self) -> Cart {
        match self.read() {
            Ok(cart) => cart,
            Err(err @ StorageError::Corrupt(_)) => {
                tracing::warn!(error = %err, "cart storage is corrupt; treating cart as empty");
                Cart::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "cart storage unreadable; treating cart as empty");
                Cart::default()
            }
        }
    }

    fn read(&self) -> Result<Cart, StorageError> {
        let Some(raw) = self.storage.load(CART_KEY)? else {
            return Ok(Cart::default());
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write(&self, cart: &Cart) -> Result<(), CartError> {
        let raw = serde_json::to_string(cart).map_err(|e| CartError::Encode(e.to_string()))?;
        self.storage.save(CART_KEY, &raw)?;
        Ok(())
    }

    /// Add `product` if absent, remove it if present, persist, and notify.
    ///
    /// The line item snapshots the sale price when the product is on sale. On a
    /// failed write nothing is notified and the persisted cart is unchanged.
    pub fn toggle_item(&self, product: &Product) -> Result<ToggleResult, CartError> {
        let mut cart = self.load();
        let (outcome, item) = cart.toggle(CartLineItem::snapshot(product));

        if let Err(err) = self.write(&cart) {
            tracing::error!(product_id = %product.id(), error = %err, "cart toggle not persisted");
            return Err(err);
        }

        tracing::info!(
            product_id = %item.id(),
            ?outcome,
            items = cart.len(),
            "cart updated"
        );

        let notice = match outcome {
            ToggleOutcome::Added => Notice::added(item.title()),
            ToggleOutcome::Removed => Notice::removed(item.title()),
        };
        self.notifier.notify(&notice);

        Ok(ToggleResult { outcome, item })
    }

    /// Number of line items, read fresh from storage.
    pub fn item_count(&self) -> usize {
        self.load().len()
    }

    /// Snapshot of the persisted cart.
    pub fn items(&self) -> Cart {
        self.load()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{Price, ProductId};

    use crate::notify::{NoticeKind, RecordingNotifier};
    use crate::storage::MemoryStore;

    fn lamp() -> Product {
        Product::new(ProductId::from(5), "Lamp", Price::from_cents(4000))
            .unwrap()
            .on_sale_at(Price::from_cents(2500))
            .unwrap()
    }

    fn mug(id: u64) -> Product {
        Product::new(ProductId::from(id), format!("Mug {id}"), Price::from_cents(900)).unwrap()
    }

    /// Accepts reads, refuses every write.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.load(key)
        }

        fn save(&self, _key: &str, _raw: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
    }

    #[test]
    fn toggling_sale_product_twice() {
        let notifier = RecordingNotifier::new();
        let store = CartStore::new(MemoryStore::new(), notifier.clone());

        let added = store.toggle_item(&lamp()).unwrap();
        assert_eq!(added.outcome, ToggleOutcome::Added);
        assert_eq!(added.item.price(), Price::from_cents(2500));
        let cart = store.items();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ProductId::from(5)).unwrap().price(), Price::from_cents(2500));

        let removed = store.toggle_item(&lamp()).unwrap();
        assert_eq!(removed.outcome, ToggleOutcome::Removed);
        assert_eq!(store.item_count(), 0);

        let notices = notifier.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].kind, NoticeKind::Success);
        assert_eq!(notices[1].kind, NoticeKind::Warning);
        assert_eq!(notices[0].title, "Lamp");
        assert_eq!(notices[1].title, "Lamp");
    }

    #[test]
    fn corrupt_storage_reads_as_empty() {
        let storage = MemoryStore::new();
        storage.put_raw(CART_KEY, r#"{"not": "a list"}"#).unwrap();
        let store = CartStore::new(storage.clone(), RecordingNotifier::new());
        assert_eq!(store.item_count(), 0);

        storage.put_raw(CART_KEY, "not json at all").unwrap();
        assert_eq!(store.item_count(), 0);

        // The next toggle overwrites the corrupt value with a valid cart.
        store.toggle_item(&mug(1)).unwrap();
        assert_eq!(store.item_count(), 1);
    }

    #[test]
    fn cart_survives_reopening_the_store() {
        let storage = MemoryStore::new();
        {
            let store = CartStore::new(storage.clone(), RecordingNotifier::new());
            for id in 1..=4 {
                store.toggle_item(&mug(id)).unwrap();
            }
            store.toggle_item(&lamp()).unwrap();
        }

        let reopened = CartStore::new(storage, RecordingNotifier::new());
        let cart = reopened.items();
        assert_eq!(cart.len(), 5);
        let summary: Vec<(String, String, u64)> = cart
            .iter()
            .map(|i| (i.id().to_string(), i.title().to_string(), i.price().cents()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1".to_string(), "Mug 1".to_string(), 900),
                ("2".to_string(), "Mug 2".to_string(), 900),
                ("3".to_string(), "Mug 3".to_string(), 900),
                ("4".to_string(), "Mug 4".to_string(), 900),
                ("5".to_string(), "Lamp".to_string(), 2500),
            ]
        );
    }

    #[test]
    fn count_reflects_writes_from_another_store() {
        let storage = MemoryStore::new();
        let badge = CartStore::new(storage.clone(), RecordingNotifier::new());
        let page = CartStore::new(storage, RecordingNotifier::new());

        page.toggle_item(&mug(1)).unwrap();
        assert_eq!(badge.item_count(), 1);
    }

    #[test]
    fn last_writer_wins_across_stores() {
        let storage = MemoryStore::new();
        let tab_a = CartStore::new(storage.clone(), RecordingNotifier::new());
        let tab_b = CartStore::new(storage.clone(), RecordingNotifier::new());

        tab_a.toggle_item(&mug(1)).unwrap();
        tab_b.toggle_item(&mug(2)).unwrap();
        // Each toggle re-reads before writing, so sequential writes compose.
        assert_eq!(tab_a.item_count(), 2);
    }

    #[test]
    fn failed_write_does_not_notify() {
        let notifier = RecordingNotifier::new();
        let store = CartStore::new(ReadOnlyStore(MemoryStore::new()), notifier.clone());

        let err = store.toggle_item(&mug(1)).unwrap_err();
        assert!(matches!(err, CartError::Storage(StorageError::Unavailable(_))));
        assert!(notifier.notices().is_empty());
        assert_eq!(store.item_count(), 0);
    }
}
