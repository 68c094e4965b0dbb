//! Client-side shopping cart with optimistic local state and best-effort
//! remote sync.
//!
//! The cart runs in one of two modes. In guest mode all state is local and
//! persisted to storage only. In authenticated mode every local mutation is
//! additionally mirrored to the remote cart service on a fire-and-forget
//! task, and pull-reconciliation adopts the server's cart wholesale at the
//! moments that matter (login, checkout, explicit refresh).
//!
//! Entry point is [`CartEngine`]; wire it to an [`HttpCartClient`] and a
//! [`JsonFileStorage`] built from [`CartConfig`], or substitute your own
//! [`RemoteCart`] / [`CartStorage`] implementations in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod engine;
pub mod error;
pub mod mode;
pub mod remote;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError};
pub use engine::{CartEngine, CheckoutSnapshot, SyncOutcome};
pub use error::{CartError, CheckoutError, InvalidLine, SyncFailure};
pub use mode::{CartMode, ModeController};
pub use remote::{HttpCartClient, RemoteCart, RemoteError};
pub use storage::{CartStorage, JsonFileStorage, MemoryStorage, StorageError, StoredCart};
pub use store::{CartState, QuantityChange};
