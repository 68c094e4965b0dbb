//! Cart error taxonomy.
//!
//! Local mutations return [`CartError`] synchronously and are the only
//! user-blocking failures outside checkout. Checkout validation has its own
//! [`CheckoutError`] set. Every remote failure is classified into a
//! [`SyncFailure`]: transient failures are logged and swallowed (local state
//! remains the truth of record), authorization failures downgrade the cart
//! to guest mode.

use thiserror::Error;

use bramble_core::{LineIssue, ProductId};

use crate::remote::RemoteError;

/// Errors from synchronous local cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Adding the requested quantity would exceed the last-known stock.
    /// The cart is left unchanged.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        /// How many more units can still be added.
        available: u32,
        /// How many units the caller asked for.
        requested: u32,
    },
}

/// Failures from checkout validation.
///
/// These are the only asynchronous failures meant to interrupt a user flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Checkout requires an authenticated session; the UI should redirect
    /// to login.
    #[error("not authenticated")]
    NotAuthenticated,

    /// No items remain after reconciliation.
    #[error("cart is empty")]
    EmptyCart,

    /// One or more lines fail validation; the UI should prompt removal or
    /// adjustment of the listed lines.
    #[error("cart contains {} invalid line(s)", .0.len())]
    InvalidItems(Vec<InvalidLine>),
}

/// A cart line that failed checkout validation, with every issue found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub product_id: ProductId,
    pub issues: Vec<LineIssue>,
}

/// Classified remote-sync failure.
///
/// Never surfaced through the mutation API; push mirroring logs transient
/// failures and reacts to authorization failures with a mode downgrade.
/// `force_sync` reports it so callers at critical junctures (login,
/// checkout) can decide what to do.
#[derive(Debug, Error)]
pub enum SyncFailure {
    /// The remote service rejected the session. The cart has been
    /// downgraded to guest mode; local items are untouched.
    #[error("session rejected by remote cart service")]
    AuthorizationDenied,

    /// A transport-level or server-side problem (timeout, 5xx, malformed
    /// response). Mode is unchanged; local state remains authoritative for
    /// the UI.
    #[error("transient sync failure: {0}")]
    Transient(RemoteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::InsufficientStock {
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock: 1 available, 2 requested"
        );
    }

    #[test]
    fn test_checkout_error_display() {
        assert_eq!(CheckoutError::NotAuthenticated.to_string(), "not authenticated");
        assert_eq!(CheckoutError::EmptyCart.to_string(), "cart is empty");

        let err = CheckoutError::InvalidItems(vec![InvalidLine {
            product_id: ProductId::new("p1"),
            issues: vec![LineIssue::NonPositiveQuantity],
        }]);
        assert_eq!(err.to_string(), "cart contains 1 invalid line(s)");
    }
}
