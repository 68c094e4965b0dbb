//! Remote cart service interface.
//!
//! The remote service owns the authoritative cart for an authenticated
//! session. The engine only ever talks to it through [`RemoteCart`], so
//! tests substitute an in-memory implementation and the HTTP transport
//! stays in one place.

mod http;

pub use http::HttpCartClient;

use std::future::Future;

use thiserror::Error;

use bramble_core::{LineItem, ProductId};

use crate::error::SyncFailure;

/// Errors from the remote cart service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The session is missing, expired, or invalid (HTTP 401).
    #[error("session not authorized")]
    Unauthorized,

    /// The service refused an add because stock ran out server-side.
    #[error("remote reports insufficient stock: {available} available, {required} required")]
    InsufficientStock { available: u32, required: u32 },

    /// Transport-level failure (connect error, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status the client does not understand.
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    /// The response body could not be decoded.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RemoteError {
    /// Classify into the sync-failure taxonomy: authorization failures
    /// trigger a mode downgrade, everything else is treated as transient
    /// and leaves the mode unchanged.
    #[must_use]
    pub fn into_sync_failure(self) -> SyncFailure {
        match self {
            Self::Unauthorized => SyncFailure::AuthorizationDenied,
            other => SyncFailure::Transient(other),
        }
    }
}

/// Operations the remote cart service exposes for the current session.
///
/// All futures are `Send` so push mirroring can run them on spawned tasks.
pub trait RemoteCart: Send + Sync + 'static {
    /// Fetch the full authoritative cart for the session.
    fn fetch_cart(&self) -> impl Future<Output = Result<Vec<LineItem>, RemoteError>> + Send;

    /// Add `quantity` units of a product (the service sums with any
    /// existing line).
    fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Remove a product's line entirely.
    fn remove_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Set a line to an absolute quantity.
    fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Remove every line from the session's cart.
    fn clear(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
