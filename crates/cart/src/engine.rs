//! The cart engine: optimistic local mutation with best-effort remote sync.
//!
//! `CartEngine` is the public surface of the crate. Mutations apply to local
//! state synchronously (the UI reacts to the returned state, never to the
//! network), persist to local storage before returning, and - only in
//! authenticated mode - spawn a fire-and-forget task mirroring the mutation
//! to the remote cart service. Push outcomes never feed back into the
//! mutation return values: transient failures are logged and swallowed,
//! authorization failures downgrade the mode to guest.
//!
//! Pushes from rapid successive mutations may complete out of order. That is
//! tolerated by design: pull-reconciliation (`force_sync`) is authoritative
//! and runs at the critical junctures (login, checkout).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, instrument, warn};

use bramble_core::{LineItem, Price, ProductId, ProductSnapshot};

use crate::error::{CartError, CheckoutError, InvalidLine, SyncFailure};
use crate::mode::{CartMode, ModeController};
use crate::remote::RemoteCart;
use crate::storage::{CartStorage, StoredCart};
use crate::store::{CartState, QuantityChange};

/// Result of a pull-reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local state was replaced wholesale by the remote cart.
    Replaced {
        /// Number of lines adopted from the remote cart.
        item_count: usize,
    },
    /// Nothing to pull: the cart is in guest mode.
    SkippedGuestMode,
}

/// Validated cart snapshot handed to order creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSnapshot {
    /// The validated lines, in cart order.
    pub items: Vec<LineItem>,
    /// Total after per-line discounts, in minor units.
    pub total: Price,
}

/// A local mutation to mirror remotely.
#[derive(Debug, Clone)]
enum PushOp {
    Add { product_id: ProductId, quantity: u32 },
    Remove { product_id: ProductId },
    SetQuantity { product_id: ProductId, quantity: u32 },
    Clear,
}

/// Dual-mode shopping cart: guest (local-only) or authenticated (mirrored to
/// the remote cart service).
///
/// Cheap to clone; clones share the same cart. Constructor-injected state -
/// tests instantiate independent engines with their own storage and remote.
pub struct CartEngine<R> {
    inner: Arc<EngineInner<R>>,
}

impl<R> Clone for CartEngine<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<R> {
    state: Mutex<CartState>,
    storage: Box<dyn CartStorage>,
    mode: ModeController,
    remote: R,
    inflight_pushes: AtomicUsize,
}

impl<R: RemoteCart> CartEngine<R> {
    /// Create an engine in guest mode, restoring any cart snapshot the
    /// storage holds. An unreadable snapshot starts an empty cart rather
    /// than failing session start.
    #[must_use]
    pub fn new(remote: R, storage: Box<dyn CartStorage>) -> Self {
        let state = match storage.load() {
            Ok(Some(record)) => CartState::new(record.items),
            Ok(None) => CartState::default(),
            Err(e) => {
                warn!(error = %e, "failed to load cart snapshot, starting empty");
                CartState::default()
            }
        };

        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(state),
                storage,
                mode: ModeController::new(),
                remote,
                inflight_pushes: AtomicUsize::new(0),
            }),
        }
    }

    fn locked(&self) -> MutexGuard<'_, CartState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist before the mutation returns. Persistence failure is logged
    /// and swallowed: the in-memory state remains the UI truth, and the
    /// next successful save will catch up.
    fn persist(&self, state: &CartState) {
        let record = StoredCart::new(state.items().to_vec());
        if let Err(e) = self.inner.storage.save(&record) {
            error!(error = %e, "failed to persist cart snapshot");
        }
    }

    // =========================================================================
    // Local Mutations (synchronous, optimistic)
    // =========================================================================

    /// Add `quantity` units of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] when the in-cart quantity
    /// plus the requested quantity exceeds the product's stock snapshot;
    /// the cart is left unchanged (all-or-nothing).
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub fn add_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> Result<CartState, CartError> {
        let snapshot = {
            let mut state = self.locked();
            state.add_item(product, quantity)?;
            self.persist(&state);
            state.clone()
        };

        self.spawn_push(PushOp::Add {
            product_id: product.product_id.clone(),
            quantity,
        });
        Ok(snapshot)
    }

    /// Remove a product's line. Idempotent; removing an absent id returns
    /// the unchanged state.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_item(&self, product_id: &ProductId) -> CartState {
        let (snapshot, removed) = {
            let mut state = self.locked();
            let removed = state.remove_item(product_id);
            if removed {
                self.persist(&state);
            }
            (state.clone(), removed)
        };

        if removed {
            self.spawn_push(PushOp::Remove {
                product_id: product_id.clone(),
            });
        }
        snapshot
    }

    /// Set a line's quantity. Zero or negative removes the line; positive
    /// values are clamped to the stock snapshot. Never fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn set_quantity(&self, product_id: &ProductId, quantity: i64) -> CartState {
        let (snapshot, change) = {
            let mut state = self.locked();
            let change = state.set_quantity(product_id, quantity);
            if change != QuantityChange::Absent {
                self.persist(&state);
            }
            (state.clone(), change)
        };

        match change {
            QuantityChange::Removed => self.spawn_push(PushOp::Remove {
                product_id: product_id.clone(),
            }),
            QuantityChange::Set(applied) => self.spawn_push(PushOp::SetQuantity {
                product_id: product_id.clone(),
                quantity: applied,
            }),
            QuantityChange::Absent => {}
        }
        snapshot
    }

    /// Remove all items. Always succeeds.
    #[instrument(skip(self))]
    pub fn clear(&self) -> CartState {
        let snapshot = {
            let mut state = self.locked();
            state.clear();
            self.persist(&state);
            state.clone()
        };

        self.spawn_push(PushOp::Clear);
        snapshot
    }

    // =========================================================================
    // Derived Queries
    // =========================================================================

    /// Current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.locked().items().to_vec()
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.locked().item_count()
    }

    /// Sum of line subtotals before discounts.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.locked().subtotal()
    }

    /// Sum of per-line discounts.
    #[must_use]
    pub fn total_discount(&self) -> Price {
        self.locked().total_discount()
    }

    /// Subtotal minus discounts.
    #[must_use]
    pub fn total(&self) -> Price {
        self.locked().total()
    }

    /// Whether the cart holds a line for this product.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.locked().is_in_cart(product_id)
    }

    /// Quantity held for this product, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.locked().quantity_of(product_id)
    }

    /// Current guest/authenticated mode.
    #[must_use]
    pub fn mode(&self) -> CartMode {
        self.inner.mode.mode()
    }

    // =========================================================================
    // Push Mirroring (fire-and-forget)
    // =========================================================================

    fn spawn_push(&self, op: PushOp) {
        if !self.inner.mode.is_authenticated() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(?op, "no async runtime, skipping cart push");
            return;
        };

        let inner = Arc::clone(&self.inner);
        inner.inflight_pushes.fetch_add(1, Ordering::AcqRel);
        handle.spawn(async move {
            let result = match &op {
                PushOp::Add {
                    product_id,
                    quantity,
                } => inner.remote.add_item(product_id, *quantity).await,
                PushOp::Remove { product_id } => inner.remote.remove_item(product_id).await,
                PushOp::SetQuantity {
                    product_id,
                    quantity,
                } => inner.remote.set_quantity(product_id, *quantity).await,
                PushOp::Clear => inner.remote.clear().await,
            };

            match result {
                Ok(()) => debug!(?op, "cart push mirrored"),
                Err(e) => match e.into_sync_failure() {
                    SyncFailure::AuthorizationDenied => inner.mode.downgrade(),
                    SyncFailure::Transient(e) => {
                        warn!(?op, error = %e, "cart push failed, local state stands");
                    }
                },
            }

            inner.inflight_pushes.fetch_sub(1, Ordering::AcqRel);
        });
    }

    /// Wait until every in-flight push task has finished. Pushes are
    /// fire-and-forget; this exists for orderly logout and for tests.
    pub async fn settle(&self) {
        while self.inner.inflight_pushes.load(Ordering::Acquire) > 0 {
            tokio::task::yield_now().await;
        }
    }

    // =========================================================================
    // Pull Reconciliation
    // =========================================================================

    /// Pull the authoritative remote cart and replace local state wholesale.
    /// An empty remote cart empties the local one. No-op in guest mode.
    ///
    /// # Errors
    ///
    /// [`SyncFailure::AuthorizationDenied`] if the session was rejected (the
    /// mode has already been downgraded); [`SyncFailure::Transient`] on
    /// transport or server failure, leaving local state untouched.
    #[instrument(skip(self))]
    pub async fn force_sync(&self) -> Result<SyncOutcome, SyncFailure> {
        if !self.inner.mode.is_authenticated() {
            return Ok(SyncOutcome::SkippedGuestMode);
        }

        match self.inner.remote.fetch_cart().await {
            Ok(items) => {
                let item_count = items.len();
                let mut state = self.locked();
                state.load_items(items);
                self.persist(&state);
                debug!(item_count, "adopted authoritative remote cart");
                Ok(SyncOutcome::Replaced { item_count })
            }
            Err(e) => {
                let failure = e.into_sync_failure();
                if matches!(failure, SyncFailure::AuthorizationDenied) {
                    self.inner.mode.downgrade();
                }
                Err(failure)
            }
        }
    }

    /// Push every guest-cart line to the remote cart ahead of a mode
    /// switch. Individual item failures (stock refused server-side,
    /// transient errors) are logged and skipped so one bad line cannot
    /// abort migration of the rest.
    ///
    /// # Errors
    ///
    /// [`SyncFailure::AuthorizationDenied`] if the session was rejected;
    /// remaining lines are not attempted.
    #[instrument(skip(self))]
    pub async fn migrate_guest_cart(&self) -> Result<(), SyncFailure> {
        let lines = self.items();
        for line in lines {
            match self
                .inner
                .remote
                .add_item(&line.product_id, line.quantity)
                .await
            {
                Ok(()) => {}
                Err(e) => match e.into_sync_failure() {
                    SyncFailure::AuthorizationDenied => {
                        self.inner.mode.downgrade();
                        return Err(SyncFailure::AuthorizationDenied);
                    }
                    SyncFailure::Transient(e) => {
                        warn!(product_id = %line.product_id, error = %e,
                            "skipping line during guest cart migration");
                    }
                },
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle Hooks
    // =========================================================================

    /// Called by the authentication layer once a user has logged in (after
    /// installing the session on the remote client). Migrates the guest
    /// cart, switches to authenticated mode, then adopts the authoritative
    /// merged remote cart.
    #[instrument(skip(self))]
    pub async fn on_login(&self) {
        if self.inner.mode.is_authenticated() {
            return;
        }

        if self.migrate_guest_cart().await.is_err() {
            // Session already rejected; keep shopping as a guest.
            return;
        }

        self.inner.mode.set_authenticated();

        if let Err(e) = self.force_sync().await {
            warn!(error = %e, "post-login reconciliation failed, keeping migrated local cart");
        }
    }

    /// Called when a session token already exists at startup. A resumed
    /// session is not a login event: the persisted snapshot was already
    /// mirrored while the session was live, so re-migrating it would
    /// double every line server-side. Switches to authenticated mode and
    /// adopts the authoritative remote cart.
    #[instrument(skip(self))]
    pub async fn resume_session(&self) {
        if self.inner.mode.is_authenticated() {
            return;
        }

        self.inner.mode.set_authenticated();

        if let Err(e) = self.force_sync().await {
            warn!(error = %e, "session resume reconciliation failed, keeping local cart");
        }
    }

    /// Called by the authentication layer on logout. Waits for in-flight
    /// pushes, then returns to guest mode. Local items are kept - the user
    /// continues shopping with whatever was last known.
    #[instrument(skip(self))]
    pub async fn on_logout(&self) {
        self.settle().await;
        self.inner.mode.set_guest();
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Validate the cart for order creation.
    ///
    /// Pull-reconciles first so server-side stock changes are caught; a
    /// transient pull failure is tolerated and validation proceeds against
    /// the last-known state.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotAuthenticated`] in guest mode (checked before
    ///   any network call) or when the reconciling pull is refused
    /// - [`CheckoutError::EmptyCart`] if no items remain after reconciliation
    /// - [`CheckoutError::InvalidItems`] listing every line that fails
    ///   validation (missing identity or title, non-positive quantity, or
    ///   quantity above the refreshed stock snapshot)
    #[instrument(skip(self))]
    pub async fn validate_for_checkout(&self) -> Result<CheckoutSnapshot, CheckoutError> {
        if !self.inner.mode.is_authenticated() {
            return Err(CheckoutError::NotAuthenticated);
        }

        match self.force_sync().await {
            Ok(_) => {}
            Err(SyncFailure::AuthorizationDenied) => return Err(CheckoutError::NotAuthenticated),
            Err(SyncFailure::Transient(e)) => {
                warn!(error = %e, "checkout reconciliation failed, validating last-known cart");
            }
        }

        let state = self.locked().clone();
        if state.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let invalid: Vec<InvalidLine> = state
            .items()
            .iter()
            .filter_map(|line| {
                let issues = line.validate();
                (!issues.is_empty()).then(|| InvalidLine {
                    product_id: line.product_id.clone(),
                    issues,
                })
            })
            .collect();

        if !invalid.is_empty() {
            return Err(CheckoutError::InvalidItems(invalid));
        }

        Ok(CheckoutSnapshot {
            total: state.total(),
            items: state.into_items(),
        })
    }
}
