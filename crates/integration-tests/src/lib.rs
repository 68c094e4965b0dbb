//! Integration tests for Bramble.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bramble-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_lifecycle` - login migration, logout, session downgrade
//! - `cart_sync` - pull reconciliation and push mirroring
//! - `cart_checkout` - checkout validation
//!
//! This crate provides [`MockRemote`], an in-memory stand-in for the remote
//! cart service: it keeps a server-side cart and a product catalog with
//! stock limits, records every call it receives, and can be switched into
//! failure modes (invalid session, transient outage) mid-test.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bramble_cart::{
    CartEngine, CartStorage, MemoryStorage, RemoteCart, RemoteError, StorageError, StoredCart,
};
use bramble_core::{LineItem, Price, ProductId, ProductSnapshot};

/// A call observed by the mock remote, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FetchCart,
    AddItem { product_id: ProductId, quantity: u32 },
    RemoveItem { product_id: ProductId },
    SetQuantity { product_id: ProductId, quantity: u32 },
    Clear,
}

#[derive(Default)]
struct MockState {
    /// Server-side cart lines, in insertion order.
    cart: Vec<LineItem>,
    /// Known products and their current server-side stock.
    catalog: HashMap<ProductId, ProductSnapshot>,
    calls: Vec<RemoteCall>,
}

/// In-memory remote cart service double.
#[derive(Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
    session_valid: AtomicBool,
    outage: AtomicBool,
}

impl MockRemote {
    /// A mock with a valid session and no products.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let mock = Self::default();
        mock.session_valid.store(true, Ordering::Release);
        Arc::new(mock)
    }

    fn locked(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a product the service knows about, with its server-side
    /// stock. Adds beyond that stock are refused.
    pub fn stock_product(&self, product: ProductSnapshot) {
        self.locked()
            .catalog
            .insert(product.product_id.clone(), product);
    }

    /// Shrink a product's server-side stock, e.g. another shopper bought it.
    pub fn set_stock(&self, product_id: &ProductId, stock: u32) {
        if let Some(product) = self.locked().catalog.get_mut(product_id) {
            product.stock_quantity = stock;
        }
    }

    /// Invalidate the session: every subsequent call is refused with an
    /// authorization error.
    pub fn invalidate_session(&self) {
        self.session_valid.store(false, Ordering::Release);
    }

    /// Restore a valid session.
    pub fn restore_session(&self) {
        self.session_valid.store(true, Ordering::Release);
    }

    /// Toggle a transient outage: calls fail with a 503 without touching
    /// the server-side cart.
    pub fn set_outage(&self, outage: bool) {
        self.outage.store(outage, Ordering::Release);
    }

    /// Calls observed so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.locked().calls.clone()
    }

    /// The server-side cart lines.
    #[must_use]
    pub fn server_cart(&self) -> Vec<LineItem> {
        self.locked().cart.clone()
    }

    /// Place lines directly into the server-side cart, bypassing the
    /// recorded call log. Simulates a cart left over from a prior session.
    pub fn seed_server_cart(&self, items: Vec<LineItem>) {
        self.locked().cart = items;
    }

    fn check(&self, state: &mut MockState, call: RemoteCall) -> Result<(), RemoteError> {
        state.calls.push(call);
        if self.outage.load(Ordering::Acquire) {
            return Err(RemoteError::UnexpectedStatus(503));
        }
        if !self.session_valid.load(Ordering::Acquire) {
            return Err(RemoteError::Unauthorized);
        }
        Ok(())
    }
}

/// Handle handed to the engine. `RemoteCart` is foreign to this crate, so
/// it must be implemented on a type this crate owns rather than on
/// `Arc<MockRemote>` directly.
#[derive(Clone)]
pub struct MockHandle(Arc<MockRemote>);

impl RemoteCart for MockHandle {
    async fn fetch_cart(&self) -> Result<Vec<LineItem>, RemoteError> {
        let mut state = self.0.locked();
        self.0.check(&mut state, RemoteCall::FetchCart)?;

        // Serve lines with the catalog's current stock, the way a real
        // service would re-derive snapshots at read time.
        let cart = state
            .cart
            .iter()
            .map(|line| {
                let mut line = line.clone();
                if let Some(product) = state.catalog.get(&line.product_id) {
                    line.stock_quantity = product.stock_quantity;
                }
                line
            })
            .collect();
        Ok(cart)
    }

    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError> {
        let mut state = self.0.locked();
        self.0.check(
            &mut state,
            RemoteCall::AddItem {
                product_id: product_id.clone(),
                quantity,
            },
        )?;

        let Some(product) = state.catalog.get(product_id).cloned() else {
            return Err(RemoteError::UnexpectedStatus(404));
        };

        let existing: u32 = state
            .cart
            .iter()
            .find(|line| &line.product_id == product_id)
            .map_or(0, |line| line.quantity);
        let requested = existing.saturating_add(quantity);
        if requested > product.stock_quantity {
            return Err(RemoteError::InsufficientStock {
                available: product.stock_quantity.saturating_sub(existing),
                required: quantity,
            });
        }

        if let Some(line) = state
            .cart
            .iter_mut()
            .find(|line| &line.product_id == product_id)
        {
            line.quantity = requested;
        } else {
            state.cart.push(LineItem::from_snapshot(product, quantity));
        }
        Ok(())
    }

    async fn remove_item(&self, product_id: &ProductId) -> Result<(), RemoteError> {
        let mut state = self.0.locked();
        self.0.check(
            &mut state,
            RemoteCall::RemoveItem {
                product_id: product_id.clone(),
            },
        )?;
        state.cart.retain(|line| &line.product_id != product_id);
        Ok(())
    }

    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError> {
        let mut state = self.0.locked();
        self.0.check(
            &mut state,
            RemoteCall::SetQuantity {
                product_id: product_id.clone(),
                quantity,
            },
        )?;
        if let Some(line) = state
            .cart
            .iter_mut()
            .find(|line| &line.product_id == product_id)
        {
            line.quantity = quantity;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        let mut state = self.0.locked();
        self.0.check(&mut state, RemoteCall::Clear)?;
        state.cart.clear();
        Ok(())
    }
}

/// A catalog product with the given stock and price in minor units.
#[must_use]
pub fn product(id: &str, stock: u32, price_minor_units: i64) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        title: format!("Product {id}"),
        unit_price: Price::from_minor_units(price_minor_units),
        discount_percent: 0,
        stock_quantity: stock,
        image_url: None,
    }
}

/// Storage handle that outlives a single engine, so tests can run several
/// engine "sessions" over the same persisted snapshot.
#[derive(Clone, Default)]
pub struct SharedStorage(Arc<MemoryStorage>);

impl SharedStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for SharedStorage {
    fn load(&self) -> Result<Option<StoredCart>, StorageError> {
        self.0.load()
    }

    fn save(&self, cart: &StoredCart) -> Result<(), StorageError> {
        self.0.save(cart)
    }
}

/// A fresh engine in guest mode over in-memory storage and the given mock.
#[must_use]
pub fn engine(remote: &Arc<MockRemote>) -> CartEngine<MockHandle> {
    engine_with_storage(remote, Box::new(MemoryStorage::new()))
}

/// An engine over the given storage, for multi-session scenarios.
#[must_use]
pub fn engine_with_storage(
    remote: &Arc<MockRemote>,
    storage: Box<dyn CartStorage>,
) -> CartEngine<MockHandle> {
    CartEngine::new(MockHandle(Arc::clone(remote)), storage)
}
