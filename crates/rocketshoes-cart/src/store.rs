//! # Cart Store
//!
//! The single owner of the shopper's cart.
//!
//! ## State Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CartStore                                      │
//! │                                                                         │
//! │   watch::Sender<Cart> ─────────► subscribe() ──► UI re-renders          │
//! │        ▲                                                                │
//! │        │ send_replace (only after the write succeeded)                  │
//! │        │                                                                │
//! │   commit(transform) ──► transform(current) ──► save_cart ──┐            │
//! │        ▲                                                   │            │
//! │        │ under commit_lock                                 │ Err        │
//! │        │                                                   ▼            │
//! │   add / remove / update                       broadcast::Sender         │
//! │   (each under its product's lock)             <Notification>            │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │                                    notifications() ──► toast            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! - Mutations on the same product run one after another (keyed lock).
//! - Mutations on different products interleave freely across their
//!   remote calls; each commit applies its change to the cart as it is at
//!   commit time, so neither overwrites the other.
//! - The persisted copy is written before observers see the new cart.
//!
//! ## Example
//! ```rust,ignore
//! let store = CartStore::load(service, db, StoreOptions::default()).await;
//! let mut toasts = store.notifications();
//!
//! if let MutationOutcome::Rejected(kind) = store.add_product(1).await {
//!     eprintln!("{}", kind.message());
//! }
//! ```

use rocketshoes_core::validation::{ensure_in_stock, ensure_matching_product};
use rocketshoes_core::{Cart, CoreResult, LineItem, ProductId, DEFAULT_STORAGE_KEY};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::api::StockService;
use crate::config::CartConfig;
use crate::error::CartResult;
use crate::lock::KeyedLocks;
use crate::notification::{MutationOutcome, Notification, Operation};
use crate::storage::{self, LocalStore};

/// Store construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Local storage key for the persisted cart.
    pub storage_key: String,

    /// Broadcast buffer for notifications.
    pub notification_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            notification_capacity: 64,
        }
    }
}

impl From<&CartConfig> for StoreOptions {
    fn from(config: &CartConfig) -> Self {
        StoreOptions {
            storage_key: config.storage.key.clone(),
            notification_capacity: config.notifications.capacity,
        }
    }
}

/// Payload for [`CartStore::update_product_amount`], as the UI sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AmountUpdate {
    pub product_id: ProductId,
    /// Requested quantity. Values below 1 are rejected, never treated as
    /// a removal.
    pub amount: i64,
}

/// The shopper's cart, its persistence, and its observers.
pub struct CartStore<S, L> {
    service: S,
    storage: L,
    storage_key: String,
    state: watch::Sender<Cart>,
    notifications: broadcast::Sender<Notification>,
    locks: KeyedLocks,
    commit_lock: Mutex<()>,
}

impl<S: StockService, L: LocalStore> CartStore<S, L> {
    /// Restores the persisted cart and creates the store.
    ///
    /// Never fails: a missing, corrupt, or unreadable persisted cart
    /// starts the session with an empty one.
    pub async fn load(service: S, storage: L, options: StoreOptions) -> Self {
        let cart = storage::load_cart(&storage, &options.storage_key).await;

        info!(
            key = %options.storage_key,
            items = cart.item_count(),
            quantity = cart.total_quantity(),
            "Cart restored"
        );

        Self::with_cart(service, storage, options, cart)
    }

    /// Creates a store around an already-loaded cart. Nothing is written
    /// until the first mutation.
    pub fn with_cart(service: S, storage: L, options: StoreOptions, cart: Cart) -> Self {
        let (state, _) = watch::channel(cart);
        // broadcast::channel panics on zero capacity
        let (notifications, _) = broadcast::channel(options.notification_capacity.max(1));

        CartStore {
            service,
            storage,
            storage_key: options.storage_key,
            state,
            notifications,
            locks: KeyedLocks::new(),
            commit_lock: Mutex::new(()),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshot of the current cart.
    pub fn cart(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Quantity of a product in the cart, 0 if absent.
    pub fn amount_of_product(&self, product_id: ProductId) -> u32 {
        self.state.borrow().amount_of(product_id)
    }

    /// Receiver that sees every committed cart.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Receiver for failure messages emitted after this call.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of a product.
    ///
    /// ## Flow
    /// ```text
    /// current = amount in cart (0 if absent)
    /// stock   = GET /stock/{id}
    /// current + 1 > stock ──► StockUnavailable
    /// current > 0         ──► line.amount = current + 1
    /// current == 0        ──► GET /products/{id}, append line with amount 1
    /// ```
    pub async fn add_product(&self, product_id: ProductId) -> MutationOutcome {
        debug!(product_id, "add_product");
        let result = self.try_add_product(product_id).await;
        self.settle(Operation::Add, product_id, result)
    }

    /// Removes a product's line. No remote calls.
    pub async fn remove_product(&self, product_id: ProductId) -> MutationOutcome {
        debug!(product_id, "remove_product");
        let result = self.try_remove_product(product_id).await;
        self.settle(Operation::Remove, product_id, result)
    }

    /// Sets a product's quantity to `update.amount`, which must be between
    /// 1 and the current stock.
    pub async fn update_product_amount(&self, update: AmountUpdate) -> MutationOutcome {
        let AmountUpdate { product_id, amount } = update;
        debug!(product_id, amount, "update_product_amount");
        let result = self.try_update_product_amount(product_id, amount).await;
        self.settle(Operation::Update, product_id, result)
    }

    async fn try_add_product(&self, product_id: ProductId) -> CartResult<()> {
        let _guard = self.locks.lock(product_id).await;

        let current = self.amount_of_product(product_id);
        let stock = self.service.stock(product_id).await?;
        let target = ensure_in_stock(product_id, i64::from(current) + 1, &stock)?;

        if current > 0 {
            return self
                .commit(|cart| cart.with_amount(product_id, target))
                .await;
        }

        let details = self.service.product(product_id).await?;
        ensure_matching_product(product_id, &details)?;
        let item = LineItem::from_product(&details, target)?;

        self.commit(move |cart| cart.with_added(item)).await
    }

    async fn try_remove_product(&self, product_id: ProductId) -> CartResult<()> {
        let _guard = self.locks.lock(product_id).await;

        self.commit(|cart| cart.without(product_id)).await
    }

    async fn try_update_product_amount(&self, product_id: ProductId, amount: i64) -> CartResult<()> {
        let _guard = self.locks.lock(product_id).await;

        let stock = self.service.stock(product_id).await?;
        let amount = ensure_in_stock(product_id, amount, &stock)?;

        self.commit(|cart| cart.with_amount(product_id, amount))
            .await
    }

    /// Builds the next cart from the current one, persists it, then
    /// publishes it. On any error the published cart is untouched.
    async fn commit<F>(&self, transform: F) -> CartResult<()>
    where
        F: FnOnce(&Cart) -> CoreResult<Cart>,
    {
        let _commit = self.commit_lock.lock().await;

        let next = {
            let current = self.state.borrow();
            transform(&*current)?
        };

        storage::save_cart(&self.storage, &self.storage_key, &next).await?;
        self.state.send_replace(next);

        Ok(())
    }

    /// Logs the result and turns a failure into exactly one notification.
    fn settle(
        &self,
        operation: Operation,
        product_id: ProductId,
        result: CartResult<()>,
    ) -> MutationOutcome {
        match result {
            Ok(()) => {
                let cart = self.state.borrow();
                info!(
                    %operation,
                    product_id,
                    amount = cart.amount_of(product_id),
                    items = cart.item_count(),
                    "Cart updated"
                );
                MutationOutcome::Applied
            }
            Err(err) => {
                let kind = err.kind_for(operation);
                if err.is_rejection() {
                    warn!(%operation, product_id, error = %err, "Cart change rejected");
                } else {
                    error!(%operation, product_id, error = %err, "Cart change failed");
                }

                // No receivers is fine: the outcome carries the kind too
                let _ = self.notifications.send(Notification::new(kind, product_id));
                MutationOutcome::Rejected(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult, StorageError, StorageResult};
    use crate::notification::NotificationKind;
    use crate::storage::MemoryStore;
    use rocketshoes_core::{ProductDetails, StockRecord};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::broadcast::error::TryRecvError;

    const KEY: &str = DEFAULT_STORAGE_KEY;

    // -------------------------------------------------------------------------
    // Fakes
    // -------------------------------------------------------------------------

    /// In-process stock service. Yields before answering so concurrent
    /// mutations really interleave.
    #[derive(Default)]
    struct FakeStockService {
        stock: StdMutex<HashMap<ProductId, i64>>,
        products: StdMutex<HashMap<ProductId, ProductDetails>>,
        offline: AtomicBool,
        stock_calls: AtomicUsize,
        product_calls: AtomicUsize,
    }

    impl FakeStockService {
        fn with_stock(pairs: &[(ProductId, i64)]) -> Self {
            let service = Self::default();
            for &(id, amount) in pairs {
                service.set_stock(id, amount);
                service.products.lock().unwrap().insert(id, details(id));
            }
            service
        }

        fn set_stock(&self, id: ProductId, amount: i64) {
            self.stock.lock().unwrap().insert(id, amount);
        }

        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        fn unavailable(resource: &str, id: ProductId) -> ApiError {
            ApiError::Status {
                url: format!("http://localhost:3333/{resource}/{id}"),
                status: 503,
            }
        }
    }

    impl StockService for FakeStockService {
        async fn stock(&self, product_id: ProductId) -> ApiResult<StockRecord> {
            self.stock_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;

            if self.offline.load(Ordering::SeqCst) {
                return Err(Self::unavailable("stock", product_id));
            }
            let amount = self.stock.lock().unwrap().get(&product_id).copied();
            amount
                .map(|amount| StockRecord::new(product_id, amount))
                .ok_or(ApiError::Status {
                    url: format!("/stock/{product_id}"),
                    status: 404,
                })
        }

        async fn product(&self, product_id: ProductId) -> ApiResult<ProductDetails> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;

            if self.offline.load(Ordering::SeqCst) {
                return Err(Self::unavailable("products", product_id));
            }
            let product = self.products.lock().unwrap().get(&product_id).cloned();
            product.ok_or(ApiError::Status {
                url: format!("/products/{product_id}"),
                status: 404,
            })
        }
    }

    /// Memory store whose writes can be switched off.
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: Arc<AtomicBool>,
        writes: Arc<AtomicUsize>,
    }

    impl LocalStore for FlakyStore {
        async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_item(key, value).await
        }
    }

    fn details(id: ProductId) -> ProductDetails {
        ProductDetails {
            id,
            title: format!("Tênis {id}"),
            price: 139.9,
            image: format!("https://rocketseat.example/tenis-{id}.jpg"),
        }
    }

    fn line(id: ProductId, amount: u32) -> LineItem {
        LineItem::from_product(&details(id), amount).unwrap()
    }

    fn persisted(lines: &[LineItem]) -> MemoryStore {
        MemoryStore::with_item(KEY, serde_json::to_string(lines).unwrap())
    }

    fn stored_cart(store: &MemoryStore) -> Cart {
        serde_json::from_str(&store.get(KEY).unwrap()).unwrap()
    }

    async fn store_with(
        service: FakeStockService,
        lines: &[LineItem],
    ) -> (CartStore<FakeStockService, MemoryStore>, MemoryStore) {
        let storage = persisted(lines);
        let store = CartStore::load(service, storage.clone(), StoreOptions::default()).await;
        (store, storage)
    }

    fn update(product_id: ProductId, amount: i64) -> AmountUpdate {
        AmountUpdate { product_id, amount }
    }

    // -------------------------------------------------------------------------
    // Load
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_load_restores_persisted_cart() {
        let (store, _) = store_with(FakeStockService::default(), &[line(1, 2), line(3, 1)]).await;

        assert_eq!(store.amount_of_product(1), 2);
        assert_eq!(store.amount_of_product(3), 1);
        assert_eq!(store.cart().item_count(), 2);
    }

    #[tokio::test]
    async fn test_load_corrupt_cart_starts_empty() {
        let storage = MemoryStore::with_item(KEY, "[{\"id\": 1, \"amo");
        let store =
            CartStore::load(FakeStockService::default(), storage.clone(), StoreOptions::default())
                .await;

        assert!(store.cart().is_empty());
        // Nothing is written until the first mutation
        assert_eq!(storage.get(KEY).as_deref(), Some("[{\"id\": 1, \"amo"));
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let storage = MemoryStore::new();
        let options = StoreOptions {
            storage_key: "@RocketShoes:kiosk".to_string(),
            notification_capacity: 4,
        };
        let store = CartStore::load(
            FakeStockService::with_stock(&[(1, 5)]),
            storage.clone(),
            options,
        )
        .await;

        assert!(store.add_product(1).await.is_applied());

        assert_eq!(store.storage_key(), "@RocketShoes:kiosk");
        assert!(storage.get("@RocketShoes:kiosk").is_some());
        assert!(storage.get(KEY).is_none());
    }

    // -------------------------------------------------------------------------
    // add_product
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_new_product() {
        let (store, storage) = store_with(FakeStockService::with_stock(&[(1, 3)]), &[]).await;

        let outcome = store.add_product(1).await;

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(store.cart().items(), &[line(1, 1)]);
        assert_eq!(stored_cart(&storage), store.cart());
    }

    #[tokio::test]
    async fn test_add_existing_product_increments_without_lookup() {
        let service = FakeStockService::with_stock(&[(1, 3)]);
        let (store, storage) = store_with(service, &[line(1, 1)]).await;

        assert!(store.add_product(1).await.is_applied());

        assert_eq!(store.amount_of_product(1), 2);
        assert_eq!(store.service().product_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.service().stock_calls.load(Ordering::SeqCst), 1);
        assert_eq!(stored_cart(&storage).amount_of(1), 2);
    }

    #[tokio::test]
    async fn test_add_appends_in_order() {
        let service = FakeStockService::with_stock(&[(1, 3), (2, 3)]);
        let (store, _) = store_with(service, &[line(2, 1)]).await;

        store.add_product(1).await;

        let ids: Vec<_> = store.cart().items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_add_beyond_stock_is_rejected() {
        let (store, storage) =
            store_with(FakeStockService::with_stock(&[(1, 2)]), &[line(1, 2)]).await;
        let mut notifications = store.notifications();
        let before = storage.get(KEY);

        let outcome = store.add_product(1).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::StockUnavailable));
        assert_eq!(store.amount_of_product(1), 2);
        assert_eq!(storage.get(KEY), before);

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.kind, NotificationKind::StockUnavailable);
        assert_eq!(notification.product_id, 1);
        assert_eq!(notification.message, "Requested quantity is out of stock");
        assert!(matches!(notifications.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_add_out_of_stock_new_product() {
        let (store, storage) = store_with(FakeStockService::with_stock(&[(1, 0)]), &[]).await;

        let outcome = store.add_product(1).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::StockUnavailable));
        assert!(store.cart().is_empty());
        assert_eq!(store.service().product_calls.load(Ordering::SeqCst), 0);
        assert_eq!(storage.get(KEY).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_add_with_service_down_is_add_error() {
        let service = FakeStockService::with_stock(&[(1, 5)]);
        service.go_offline();
        let (store, _) = store_with(service, &[line(1, 1)]).await;
        let mut notifications = store.notifications();

        let outcome = store.add_product(1).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::AddError));
        assert_eq!(store.amount_of_product(1), 1);
        assert_eq!(notifications.try_recv().unwrap().message, "Error adding product");
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_add_error() {
        // Stock says yes, but the catalog has never heard of it
        let service = FakeStockService::default();
        service.set_stock(7, 10);
        let (store, _) = store_with(service, &[]).await;

        let outcome = store.add_product(7).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::AddError));
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_add_with_mismatched_product_is_add_error() {
        let service = FakeStockService::with_stock(&[(1, 5)]);
        service.products.lock().unwrap().insert(1, details(2));
        let (store, _) = store_with(service, &[]).await;

        let outcome = store.add_product(1).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::AddError));
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_add_with_invalid_product_payload_is_add_error() {
        let service = FakeStockService::with_stock(&[(1, 5)]);
        let mut bad = details(1);
        bad.price = f64::NAN;
        service.products.lock().unwrap().insert(1, bad);
        let (store, _) = store_with(service, &[]).await;

        let outcome = store.add_product(1).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::AddError));
    }

    #[tokio::test]
    async fn test_add_keeps_long_and_blank_titles() {
        let long_title = "T".repeat(201);
        let service = FakeStockService::with_stock(&[(1, 5), (2, 5)]);
        {
            let mut products = service.products.lock().unwrap();
            products.insert(
                1,
                ProductDetails {
                    title: long_title.clone(),
                    ..details(1)
                },
            );
            products.insert(
                2,
                ProductDetails {
                    title: String::new(),
                    ..details(2)
                },
            );
        }
        let (store, storage) = store_with(service, &[]).await;

        assert_eq!(store.add_product(1).await, MutationOutcome::Applied);
        assert_eq!(store.add_product(2).await, MutationOutcome::Applied);

        let cart = store.cart();
        assert_eq!(cart.items()[0].title, long_title);
        assert_eq!(cart.items()[1].title, "");
        assert_eq!(stored_cart(&storage).items()[0].title, long_title);
    }

    // -------------------------------------------------------------------------
    // remove_product
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_remove_product() {
        let (store, storage) = store_with(FakeStockService::default(), &[line(5, 1)]).await;

        let outcome = store.remove_product(5).await;

        assert_eq!(outcome, MutationOutcome::Applied);
        assert!(store.cart().is_empty());
        assert_eq!(storage.get(KEY).as_deref(), Some("[]"));
        assert_eq!(store.service().stock_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remove_keeps_other_lines() {
        let (store, _) =
            store_with(FakeStockService::default(), &[line(1, 1), line(2, 3), line(3, 2)]).await;

        store.remove_product(2).await;

        assert_eq!(store.cart().items(), &[line(1, 1), line(3, 2)]);
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_remove_error() {
        let (store, storage) = store_with(FakeStockService::default(), &[line(1, 1)]).await;
        let mut notifications = store.notifications();

        let outcome = store.remove_product(99).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::RemoveError));
        assert_eq!(store.cart().items(), &[line(1, 1)]);
        assert_eq!(stored_cart(&storage).items(), &[line(1, 1)]);

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.kind, NotificationKind::RemoveError);
        assert_eq!(notification.product_id, 99);
    }

    // -------------------------------------------------------------------------
    // update_product_amount
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_update_amount() {
        let (store, storage) =
            store_with(FakeStockService::with_stock(&[(2, 10)]), &[line(2, 1)]).await;

        let outcome = store.update_product_amount(update(2, 5)).await;

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(store.cart().items(), &[line(2, 5)]);
        assert_eq!(stored_cart(&storage).items(), &[line(2, 5)]);
    }

    #[tokio::test]
    async fn test_update_to_exact_stock() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(2, 4)]), &[line(2, 1)]).await;

        assert!(store.update_product_amount(update(2, 4)).await.is_applied());
        assert_eq!(store.amount_of_product(2), 4);
    }

    #[tokio::test]
    async fn test_update_to_zero_is_rejected_not_removed() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(1, 10)]), &[line(1, 3)]).await;

        for amount in [0, -1] {
            let outcome = store.update_product_amount(update(1, amount)).await;
            assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::StockUnavailable));
        }

        assert_eq!(store.amount_of_product(1), 3);
    }

    #[tokio::test]
    async fn test_update_beyond_stock_is_rejected() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(1, 3)]), &[line(1, 1)]).await;

        let outcome = store.update_product_amount(update(1, 4)).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::StockUnavailable));
        assert_eq!(store.amount_of_product(1), 1);
    }

    #[tokio::test]
    async fn test_update_absent_product_is_update_error() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(8, 10)]), &[line(1, 1)]).await;
        let mut notifications = store.notifications();

        let outcome = store.update_product_amount(update(8, 2)).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::UpdateError));
        assert!(!store.cart().contains(8));
        assert_eq!(
            notifications.try_recv().unwrap().message,
            "Error changing product quantity"
        );
    }

    #[tokio::test]
    async fn test_update_with_service_down_is_update_error() {
        let service = FakeStockService::with_stock(&[(1, 10)]);
        service.go_offline();
        let (store, _) = store_with(service, &[line(1, 1)]).await;

        let outcome = store.update_product_amount(update(1, 2)).await;

        assert_eq!(outcome, MutationOutcome::Rejected(NotificationKind::UpdateError));
        assert_eq!(store.amount_of_product(1), 1);
    }

    #[test]
    fn test_amount_update_payload() {
        let parsed: AmountUpdate =
            serde_json::from_str(r#"{ "productId": 3, "amount": 2 }"#).unwrap();
        assert_eq!(parsed, update(3, 2));
    }

    // -------------------------------------------------------------------------
    // Queries and observers
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_amount_query_is_idempotent() {
        let (store, _) = store_with(FakeStockService::default(), &[line(4, 3)]).await;
        let before = store.cart();

        for _ in 0..3 {
            assert_eq!(store.amount_of_product(4), 3);
            assert_eq!(store.amount_of_product(40), 0);
        }

        assert_eq!(store.cart(), before);
    }

    #[tokio::test]
    async fn test_subscriber_sees_commits_only() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(1, 1)]), &[]).await;
        let mut rx = store.subscribe();

        store.add_product(1).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().amount_of(1), 1);

        // Rejected: no new cart published
        store.add_product(1).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_success_emits_no_notification() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(1, 5)]), &[]).await;
        let mut notifications = store.notifications();

        store.add_product(1).await;
        store.update_product_amount(update(1, 3)).await;
        store.remove_product(1).await;

        assert!(matches!(notifications.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_rejection_without_listeners() {
        let (store, _) = store_with(FakeStockService::default(), &[]).await;

        assert_eq!(
            store.remove_product(1).await,
            MutationOutcome::Rejected(NotificationKind::RemoveError)
        );
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_storage_failure_leaves_memory_unchanged() {
        let storage = FlakyStore::default();
        let store = CartStore::load(
            FakeStockService::with_stock(&[(1, 5)]),
            storage.clone(),
            StoreOptions::default(),
        )
        .await;
        let mut notifications = store.notifications();
        let mut rx = store.subscribe();

        assert!(store.add_product(1).await.is_applied());
        rx.borrow_and_update();

        storage.fail_writes.store(true, Ordering::SeqCst);

        assert_eq!(
            store.add_product(1).await,
            MutationOutcome::Rejected(NotificationKind::AddError)
        );
        assert_eq!(
            store.update_product_amount(update(1, 4)).await,
            MutationOutcome::Rejected(NotificationKind::UpdateError)
        );
        assert_eq!(
            store.remove_product(1).await,
            MutationOutcome::Rejected(NotificationKind::RemoveError)
        );

        assert_eq!(store.amount_of_product(1), 1);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);

        let kinds: Vec<_> = std::iter::from_fn(|| notifications.try_recv().ok())
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::AddError,
                NotificationKind::UpdateError,
                NotificationKind::RemoveError
            ]
        );
    }

    #[tokio::test]
    async fn test_reload_reproduces_cart() {
        let storage = MemoryStore::new();
        let service = FakeStockService::with_stock(&[(1, 5), (2, 5)]);
        let first = CartStore::load(service, storage.clone(), StoreOptions::default()).await;

        first.add_product(1).await;
        first.add_product(2).await;
        first.add_product(2).await;
        first.update_product_amount(update(1, 4)).await;
        let expected = first.cart();

        let second =
            CartStore::load(FakeStockService::default(), storage, StoreOptions::default()).await;

        assert_eq!(second.cart(), expected);
        assert_eq!(second.amount_of_product(1), 4);
        assert_eq!(second.amount_of_product(2), 2);
    }

    #[tokio::test]
    async fn test_with_database_storage() {
        let db = rocketshoes_db::Database::new(rocketshoes_db::DbConfig::in_memory())
            .await
            .unwrap();
        let store = CartStore::load(
            FakeStockService::with_stock(&[(1, 2)]),
            db.clone(),
            StoreOptions::default(),
        )
        .await;

        store.add_product(1).await;
        store.add_product(1).await;

        let reloaded = storage::load_cart(&db, KEY).await;
        assert_eq!(reloaded.amount_of(1), 2);
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_concurrent_adds_of_different_products_both_survive() {
        let service = FakeStockService::with_stock(&[(1, 5), (2, 5)]);
        let (store, storage) = store_with(service, &[]).await;

        let (a, b) = tokio::join!(store.add_product(1), store.add_product(2));

        assert!(a.is_applied() && b.is_applied());
        assert_eq!(store.amount_of_product(1), 1);
        assert_eq!(store.amount_of_product(2), 1);
        assert_eq!(stored_cart(&storage), store.cart());
    }

    #[tokio::test]
    async fn test_concurrent_adds_of_same_product_both_count() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(1, 5)]), &[]).await;

        let (a, b, c) = tokio::join!(
            store.add_product(1),
            store.add_product(1),
            store.add_product(1)
        );

        assert!(a.is_applied() && b.is_applied() && c.is_applied());
        assert_eq!(store.amount_of_product(1), 3);
        assert_eq!(store.cart().item_count(), 1);
        // Only the first add looked the product up
        assert_eq!(store.service().product_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_respect_stock() {
        let (store, _) = store_with(FakeStockService::with_stock(&[(1, 2)]), &[]).await;

        let (a, b, c) = tokio::join!(
            store.add_product(1),
            store.add_product(1),
            store.add_product(1)
        );

        let applied = [a, b, c].iter().filter(|o| o.is_applied()).count();
        assert_eq!(applied, 2);
        assert_eq!(store.amount_of_product(1), 2);
    }

    #[tokio::test]
    async fn test_concurrent_update_and_remove_of_different_products() {
        let service = FakeStockService::with_stock(&[(1, 9), (2, 9)]);
        let (store, storage) = store_with(service, &[line(1, 1), line(2, 1)]).await;

        let (a, b) = tokio::join!(
            store.update_product_amount(update(1, 6)),
            store.remove_product(2)
        );

        assert!(a.is_applied() && b.is_applied());
        assert_eq!(store.cart().items(), &[line(1, 6)]);
        assert_eq!(stored_cart(&storage), store.cart());
    }

    #[tokio::test]
    async fn test_store_is_shareable_across_tasks() {
        let service = FakeStockService::with_stock(&[(1, 10), (2, 10), (3, 10)]);
        let store = Arc::new(
            CartStore::load(service, MemoryStore::new(), StoreOptions::default()).await,
        );

        let handles: Vec<_> = [1, 2, 3, 1, 2, 3]
            .into_iter()
            .map(|id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add_product(id).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_applied());
        }

        for id in 1..=3 {
            assert_eq!(store.amount_of_product(id), 2);
        }
    }
}
