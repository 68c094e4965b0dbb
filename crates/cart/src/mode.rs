//! Guest/authenticated mode tracking.
//!
//! The mode decides whether local mutations are mirrored to the remote cart
//! service. Transitions are driven by external signals only: the login and
//! logout hooks, and authorization-denied responses observed by the sync
//! layer. Transport errors (timeouts, 5xx) never change the mode - they
//! indicate a transient server problem, not a session-validity problem.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Whether the cart mirrors an authenticated server-side record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartMode {
    /// Cart state lives only in local persistent storage.
    Guest,
    /// Cart state is expected to mirror the server-side record for the
    /// logged-in session.
    Authenticated,
}

impl std::fmt::Display for CartMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Tracks the current [`CartMode`].
///
/// Transitions are bidirectional and externally driven; there is no terminal
/// state. Items are never cleared by a mode transition.
#[derive(Debug, Default)]
pub struct ModeController {
    authenticated: AtomicBool,
}

impl ModeController {
    /// New controller in the initial `Guest` mode.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            authenticated: AtomicBool::new(false),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> CartMode {
        if self.is_authenticated() {
            CartMode::Authenticated
        } else {
            CartMode::Guest
        }
    }

    /// Whether mutations should be mirrored remotely.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// Guest -> Authenticated, driven by the login hook.
    pub fn set_authenticated(&self) {
        if !self.authenticated.swap(true, Ordering::AcqRel) {
            tracing::info!("cart mode: guest -> authenticated");
        }
    }

    /// Authenticated -> Guest, driven by the logout hook.
    pub fn set_guest(&self) {
        if self.authenticated.swap(false, Ordering::AcqRel) {
            tracing::info!("cart mode: authenticated -> guest");
        }
    }

    /// Authenticated -> Guest, driven by an authorization-denied response.
    ///
    /// The user keeps shopping as a guest with whatever was last known
    /// locally.
    pub fn downgrade(&self) {
        if self.authenticated.swap(false, Ordering::AcqRel) {
            tracing::warn!("session rejected by remote cart service, downgrading to guest mode");
        }
    }
}
