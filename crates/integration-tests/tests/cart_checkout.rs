//! Integration tests for checkout validation.

#![allow(clippy::unwrap_used)]

use bramble_cart::{CartMode, CheckoutError};
use bramble_core::{LineIssue, Price, ProductId};
use bramble_integration_tests::{MockRemote, engine, product};

#[tokio::test]
async fn test_guest_checkout_is_blocked_without_network() {
    let remote = MockRemote::new();
    let cart = engine(&remote);
    cart.add_item(&product("mug", 10, 1850), 1).unwrap();

    let err = cart.validate_for_checkout().await.unwrap_err();

    assert_eq!(err, CheckoutError::NotAuthenticated);
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let remote = MockRemote::new();
    let cart = engine(&remote);
    cart.on_login().await;

    let err = cart.validate_for_checkout().await.unwrap_err();
    assert_eq!(err, CheckoutError::EmptyCart);
}

#[tokio::test]
async fn test_valid_cart_yields_order_snapshot() {
    let remote = MockRemote::new();
    remote.stock_product(product("mug", 10, 1850));
    remote.stock_product(product("tote", 10, 2400));

    let cart = engine(&remote);
    cart.on_login().await;
    cart.add_item(&product("mug", 10, 1850), 2).unwrap();
    cart.add_item(&product("tote", 10, 2400), 1).unwrap();
    cart.settle().await;

    let snapshot = cart.validate_for_checkout().await.unwrap();

    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.total, Price::from_minor_units(2 * 1850 + 2400));
}

#[tokio::test]
async fn test_stock_shrunk_server_side_surfaces_invalid_line() {
    let remote = MockRemote::new();
    remote.stock_product(product("mug", 5, 1850));

    let cart = engine(&remote);
    cart.on_login().await;
    cart.add_item(&product("mug", 5, 1850), 3).unwrap();
    cart.settle().await;

    // Another shopper bought most of the stock before checkout.
    remote.set_stock(&ProductId::new("mug"), 1);

    let err = cart.validate_for_checkout().await.unwrap_err();

    let CheckoutError::InvalidItems(lines) = err else {
        panic!("expected InvalidItems, got {err:?}");
    };
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_id, ProductId::new("mug"));
    assert_eq!(
        lines[0].issues,
        vec![LineIssue::ExceedsStock {
            quantity: 3,
            available: 1
        }]
    );
}

#[tokio::test]
async fn test_transient_outage_validates_last_known_cart() {
    let remote = MockRemote::new();
    remote.stock_product(product("mug", 10, 1850));

    let cart = engine(&remote);
    cart.on_login().await;
    cart.add_item(&product("mug", 10, 1850), 2).unwrap();
    cart.settle().await;

    // The reconciling pull fails, but the last-known cart is still valid.
    remote.set_outage(true);
    let snapshot = cart.validate_for_checkout().await.unwrap();

    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.total, Price::from_minor_units(2 * 1850));
}

#[tokio::test]
async fn test_expired_session_maps_to_not_authenticated() {
    let remote = MockRemote::new();
    remote.stock_product(product("mug", 10, 1850));

    let cart = engine(&remote);
    cart.on_login().await;
    cart.add_item(&product("mug", 10, 1850), 2).unwrap();
    cart.settle().await;

    remote.invalidate_session();
    let err = cart.validate_for_checkout().await.unwrap_err();

    assert_eq!(err, CheckoutError::NotAuthenticated);
    // The refused pull also downgraded the mode.
    assert_eq!(cart.mode(), CartMode::Guest);
}
