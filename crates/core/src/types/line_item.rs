//! Cart line items and the product snapshots they are built from.
//!
//! A [`ProductSnapshot`] captures product data at the moment it enters the
//! cart (title, price, discount, last-known stock). A [`LineItem`] is a
//! snapshot plus a quantity. Prices and stock are deliberately *not*
//! re-fetched after add; the remote service enforces the real constraints at
//! order time, the snapshot only drives client-side clamping and display.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;

/// Product data captured at add-to-cart time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Opaque stable product identifier.
    pub product_id: ProductId,
    /// Display name at time of add.
    pub title: String,
    /// Unit price in minor units at time of add.
    #[serde(rename = "unitPriceMinorUnits")]
    pub unit_price: Price,
    /// Discount percentage, 0-100.
    pub discount_percent: u8,
    /// Last known available stock. Client-side clamp bound only; the remote
    /// service enforces the real constraint at order time.
    #[serde(rename = "stockQuantityAtSnapshot")]
    pub stock_quantity: u32,
    /// Optional display image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One product entry and its quantity within a cart.
///
/// Invariant: `quantity >= 1`. A line with quantity zero must not exist;
/// removal, not a zero-quantity row, represents "not in cart".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Opaque stable product identifier, unique within the cart.
    pub product_id: ProductId,
    /// Display name snapshot at time of add.
    pub title: String,
    /// Unit price in minor units, snapshot at add time.
    #[serde(rename = "unitPriceMinorUnits")]
    pub unit_price: Price,
    /// Discount percentage, 0-100, snapshot at add time.
    pub discount_percent: u8,
    /// Positive quantity of this product in the cart.
    pub quantity: u32,
    /// Last known available stock, used only as a client-side upper bound.
    #[serde(rename = "stockQuantityAtSnapshot")]
    pub stock_quantity: u32,
    /// Optional display image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A problem with a single line item, surfaced by checkout validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineIssue {
    /// The product identifier is empty.
    #[error("missing product identifier")]
    MissingProductId,

    /// The display title is empty.
    #[error("missing title")]
    MissingTitle,

    /// The quantity is zero.
    #[error("non-positive quantity")]
    NonPositiveQuantity,

    /// The quantity exceeds the last-known stock.
    #[error("quantity {quantity} exceeds available stock {available}")]
    ExceedsStock { quantity: u32, available: u32 },
}

impl LineItem {
    /// Build a line item from a product snapshot and a quantity.
    #[must_use]
    pub fn from_snapshot(snapshot: ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: snapshot.product_id,
            title: snapshot.title,
            unit_price: snapshot.unit_price,
            discount_percent: snapshot.discount_percent,
            quantity,
            stock_quantity: snapshot.stock_quantity,
            image_url: snapshot.image_url,
        }
    }

    /// Line subtotal before discount: `unit_price * quantity`.
    #[must_use]
    pub const fn line_subtotal(&self) -> Price {
        self.unit_price.saturating_mul(self.quantity)
    }

    /// Discount amount for the line, floored to whole minor units. The
    /// intermediate product is widened to `i128` so extreme subtotals
    /// saturate like the rest of the money math instead of wrapping.
    #[must_use]
    pub fn line_discount(&self) -> Price {
        let subtotal = i128::from(self.line_subtotal().minor_units());
        let discount = subtotal * i128::from(self.discount_percent.min(100)) / 100;
        Price::from_minor_units(i64::try_from(discount).unwrap_or(i64::MAX))
    }

    /// Line total after discount.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.line_subtotal().saturating_sub(self.line_discount())
    }

    /// Check the line against the cart invariants.
    ///
    /// Returns every issue found, so callers can present all problems with a
    /// line at once rather than one per round trip.
    #[must_use]
    pub fn validate(&self) -> Vec<LineIssue> {
        let mut issues = Vec::new();
        if self.product_id.is_empty() {
            issues.push(LineIssue::MissingProductId);
        }
        if self.title.trim().is_empty() {
            issues.push(LineIssue::MissingTitle);
        }
        if self.quantity == 0 {
            issues.push(LineIssue::NonPositiveQuantity);
        }
        if self.quantity > self.stock_quantity {
            issues.push(LineIssue::ExceedsStock {
                quantity: self.quantity,
                available: self.stock_quantity,
            });
        }
        issues
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(id: &str) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new(id),
            title: "Ceramic Mug".to_string(),
            unit_price: Price::from_minor_units(1000),
            discount_percent: 0,
            stock_quantity: 5,
            image_url: None,
        }
    }

    #[test]
    fn test_line_money_math_without_discount() {
        let line = LineItem::from_snapshot(snapshot("p1"), 3);
        assert_eq!(line.line_subtotal(), Price::from_minor_units(3000));
        assert_eq!(line.line_discount(), Price::ZERO);
        assert_eq!(line.line_total(), Price::from_minor_units(3000));
    }

    #[test]
    fn test_line_discount_floors_to_minor_units() {
        let mut snap = snapshot("p1");
        snap.unit_price = Price::from_minor_units(333);
        snap.discount_percent = 10;
        let line = LineItem::from_snapshot(snap, 1);
        // 333 * 10 / 100 = 33.3, floored to 33
        assert_eq!(line.line_discount(), Price::from_minor_units(33));
        assert_eq!(line.line_total(), Price::from_minor_units(300));
    }

    #[test]
    fn test_discount_percent_over_100_is_capped() {
        let mut snap = snapshot("p1");
        snap.discount_percent = 250;
        let line = LineItem::from_snapshot(snap, 1);
        assert_eq!(line.line_total(), Price::ZERO);
    }

    #[test]
    fn test_line_discount_extreme_subtotal_does_not_wrap() {
        let mut snap = snapshot("p1");
        snap.unit_price = Price::from_minor_units(i64::MAX);
        snap.discount_percent = 50;
        let line = LineItem::from_snapshot(snap, 1);

        assert_eq!(line.line_discount(), Price::from_minor_units(i64::MAX / 2));
        assert!(line.line_total().minor_units() >= 0);
    }

    #[test]
    fn test_validate_ok() {
        let line = LineItem::from_snapshot(snapshot("p1"), 5);
        assert!(line.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_all_issues() {
        let mut line = LineItem::from_snapshot(snapshot(""), 0);
        line.title = String::new();
        let issues = line.validate();
        assert!(issues.contains(&LineIssue::MissingProductId));
        assert!(issues.contains(&LineIssue::MissingTitle));
        assert!(issues.contains(&LineIssue::NonPositiveQuantity));
    }

    #[test]
    fn test_validate_exceeds_stock() {
        let line = LineItem::from_snapshot(snapshot("p1"), 9);
        assert_eq!(
            line.validate(),
            vec![LineIssue::ExceedsStock {
                quantity: 9,
                available: 5
            }]
        );
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let line = LineItem::from_snapshot(snapshot("p1"), 2);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["productId"], "p1");
        assert_eq!(json["unitPriceMinorUnits"], 1000);
        assert_eq!(json["stockQuantityAtSnapshot"], 5);
        assert_eq!(json["discountPercent"], 0);
        assert!(json.get("imageUrl").is_none());
    }
}
