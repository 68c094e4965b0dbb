//! In-memory cart state and its transition functions.
//!
//! `CartState` is an ordered collection of line items keyed by product
//! identity. All transitions are synchronous and pure with respect to I/O;
//! the engine persists the state and mirrors mutations remotely. The only
//! transition that can fail is `add_item` (insufficient stock), and it is
//! all-or-nothing: a failed add leaves the state untouched.

use serde::{Deserialize, Serialize};
use tracing::warn;

use bramble_core::{LineItem, Price, ProductId, ProductSnapshot};

use crate::error::CartError;

/// Outcome of a `set_quantity` call, used by the engine to decide which
/// remote mutation to mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line was removed (requested quantity was zero or negative).
    Removed,
    /// The line's quantity is now this value (possibly clamped to stock).
    Set(u32),
    /// The product was not in the cart; nothing changed.
    Absent,
}

/// Ordered cart line items, unique by product id, insertion order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// Build a state from existing lines, dropping duplicate product ids
    /// (first occurrence wins).
    #[must_use]
    pub fn new(items: Vec<LineItem>) -> Self {
        let mut state = Self::default();
        state.load_items(items);
        state
    }

    /// The current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consume the state, yielding its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart the quantities are summed and
    /// the stock snapshot is refreshed from the incoming product data.
    /// Otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] when the in-cart quantity
    /// plus the requested quantity would exceed the product's stock
    /// snapshot. No mutation happens on failure.
    pub fn add_item(
        &mut self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> Result<(), CartError> {
        let in_cart = self.quantity_of(&product.product_id);
        let requested_total = u64::from(in_cart) + u64::from(quantity);
        if requested_total > u64::from(product.stock_quantity) {
            return Err(CartError::InsufficientStock {
                available: product.stock_quantity.saturating_sub(in_cart),
                requested: quantity,
            });
        }

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == product.product_id)
        {
            line.quantity += quantity;
            // The caller just looked at the product page, so this stock
            // figure is fresher than the one taken at first add.
            line.stock_quantity = product.stock_quantity;
        } else {
            self.items
                .push(LineItem::from_snapshot(product.clone(), quantity));
        }
        Ok(())
    }

    /// Remove a product's line. Idempotent: removing an absent id is a
    /// no-op. Returns whether a line was actually removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| &line.product_id != product_id);
        self.items.len() != before
    }

    /// Set a line's quantity.
    ///
    /// A quantity of zero or less removes the line. Positive quantities are
    /// clamped to the line's stock snapshot - clamping, not rejection, so
    /// this call never fails.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> QuantityChange {
        if quantity <= 0 {
            return if self.remove_item(product_id) {
                QuantityChange::Removed
            } else {
                QuantityChange::Absent
            };
        }

        let Some(line) = self
            .items
            .iter_mut()
            .find(|line| &line.product_id == product_id)
        else {
            return QuantityChange::Absent;
        };

        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        line.quantity = requested.min(line.stock_quantity);
        QuantityChange::Set(line.quantity)
    }

    /// Remove all lines. Always succeeds.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Wholesale replacement by the authoritative remote cart
    /// (pull-reconciliation). Supersedes all prior lines; no merging and no
    /// clamping - a remote quantity above the stock snapshot is kept and
    /// surfaced at checkout validation instead.
    pub fn load_items(&mut self, items: Vec<LineItem>) {
        self.items.clear();
        for line in items {
            if self.is_in_cart(&line.product_id) {
                warn!(product_id = %line.product_id, "duplicate line in loaded cart, keeping first");
                continue;
            }
            self.items.push(line);
        }
    }

    // =========================================================================
    // Derived Queries
    // =========================================================================

    /// Total unit count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line subtotals before discounts.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items
            .iter()
            .map(LineItem::line_subtotal)
            .fold(Price::ZERO, Price::saturating_add)
    }

    /// Sum of per-line discounts.
    #[must_use]
    pub fn total_discount(&self) -> Price {
        self.items
            .iter()
            .map(LineItem::line_discount)
            .fold(Price::ZERO, Price::saturating_add)
    }

    /// Subtotal minus per-line discounts.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal().saturating_sub(self.total_discount())
    }

    /// Whether the cart holds a line for this product.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|line| &line.product_id == product_id)
    }

    /// Quantity held for this product, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|line| &line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, stock: u32, price: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new(id),
            title: format!("Product {id}"),
            unit_price: Price::from_minor_units(price),
            discount_percent: 0,
            stock_quantity: stock,
            image_url: None,
        }
    }

    fn line(id: &str, quantity: u32, stock: u32, price: i64) -> LineItem {
        LineItem::from_snapshot(product(id, stock, price), quantity)
    }

    #[test]
    fn test_guest_add_remove_round_trip() {
        let mut state = CartState::default();

        state.add_item(&product("p1", 5, 1000), 2).unwrap();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.item_count(), 2);
        assert_eq!(state.total(), Price::from_minor_units(2000));

        state.remove_item(&ProductId::new("p1"));
        assert!(state.is_empty());
        assert_eq!(state.item_count(), 0);
    }

    #[test]
    fn test_add_same_product_sums_quantity() {
        let mut state = CartState::default();
        state.add_item(&product("p1", 10, 500), 2).unwrap();
        state.add_item(&product("p1", 10, 500), 3).unwrap();

        // Never two lines for the same product id.
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.quantity_of(&ProductId::new("p1")), 5);
    }

    #[test]
    fn test_add_refreshes_stock_snapshot() {
        let mut state = CartState::default();
        state.add_item(&product("p1", 10, 500), 2).unwrap();
        state.add_item(&product("p1", 4, 500), 1).unwrap();
        assert_eq!(state.items()[0].stock_quantity, 4);
    }

    #[test]
    fn test_add_insufficient_stock_is_all_or_nothing() {
        let mut state = CartState::default();
        state.add_item(&product("p1", 5, 1000), 4).unwrap();
        let before = state.clone();

        let err = state.add_item(&product("p1", 5, 1000), 2).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                available: 1,
                requested: 2
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_add_when_stock_shrank_below_in_cart() {
        let mut state = CartState::default();
        state.add_item(&product("p1", 5, 1000), 4).unwrap();

        // Stock dropped to 3 server-side; available must not go negative.
        let err = state.add_item(&product("p1", 3, 1000), 1).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                available: 0,
                requested: 1
            }
        );
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut state = CartState::new(vec![line("p1", 2, 5, 1000)]);
        let before = state.clone();
        assert!(!state.remove_item(&ProductId::new("ghost")));
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_quantity_clamps_to_stock() {
        let mut state = CartState::new(vec![line("p1", 2, 5, 1000)]);
        let change = state.set_quantity(&ProductId::new("p1"), 99);
        assert_eq!(change, QuantityChange::Set(5));
        assert_eq!(state.quantity_of(&ProductId::new("p1")), 5);
    }

    #[test]
    fn test_set_quantity_zero_and_negative_equal_remove() {
        let base = CartState::new(vec![line("p1", 2, 5, 1000), line("p2", 1, 9, 200)]);

        let mut removed = base.clone();
        removed.remove_item(&ProductId::new("p1"));

        let mut via_zero = base.clone();
        assert_eq!(
            via_zero.set_quantity(&ProductId::new("p1"), 0),
            QuantityChange::Removed
        );
        assert_eq!(via_zero, removed);

        let mut via_negative = base;
        assert_eq!(
            via_negative.set_quantity(&ProductId::new("p1"), -5),
            QuantityChange::Removed
        );
        assert_eq!(via_negative, removed);
    }

    #[test]
    fn test_set_quantity_absent_product() {
        let mut state = CartState::default();
        assert_eq!(
            state.set_quantity(&ProductId::new("ghost"), 3),
            QuantityChange::Absent
        );
        assert!(state.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut state = CartState::new(vec![line("p1", 2, 5, 1000), line("p2", 1, 9, 200)]);
        state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn test_load_items_replaces_not_merges() {
        let mut state = CartState::new(vec![line("a", 2, 9, 100), line("b", 1, 9, 100)]);
        state.load_items(vec![line("b", 3, 9, 100), line("c", 1, 9, 100)]);

        let ids: Vec<_> = state.items().iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(state.quantity_of(&ProductId::new("b")), 3);
    }

    #[test]
    fn test_load_items_drops_duplicate_ids() {
        let mut state = CartState::default();
        state.load_items(vec![line("a", 2, 9, 100), line("a", 7, 9, 100)]);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.quantity_of(&ProductId::new("a")), 2);
    }

    #[test]
    fn test_totals_with_discounts() {
        let mut discounted = product("p1", 10, 1000);
        discounted.discount_percent = 25;
        let mut state = CartState::default();
        state.add_item(&discounted, 2).unwrap();
        state.add_item(&product("p2", 10, 500), 1).unwrap();

        assert_eq!(state.subtotal(), Price::from_minor_units(2500));
        assert_eq!(state.total_discount(), Price::from_minor_units(500));
        assert_eq!(state.total(), Price::from_minor_units(2000));
    }
}
