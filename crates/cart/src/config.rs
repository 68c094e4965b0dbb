//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the remote cart service
//!
//! ## Optional
//! - `CART_API_SESSION_TOKEN` - Bearer session token for an already
//!   authenticated session (normally installed at runtime by the auth layer)
//! - `CART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `CART_STORAGE_PATH` - Local cart snapshot path
//!   (default: `.bramble-cart.json`)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_PATH: &str = ".bramble-cart.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
///
/// Implements `Debug` manually to redact the session token.
#[derive(Clone)]
pub struct CartConfig {
    /// Base URL of the remote cart service.
    pub api_base_url: String,
    /// Bearer session token, if a session already exists.
    pub session_token: Option<SecretString>,
    /// Per-request timeout for remote calls.
    pub request_timeout: Duration,
    /// Path of the local cart snapshot.
    pub storage_path: PathBuf,
}

impl std::fmt::Debug for CartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("storage_path", &self.storage_path)
            .finish()
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("CART_API_BASE_URL")?;
        let session_token = get_optional_env("CART_API_SESSION_TOKEN").map(SecretString::from);
        let request_timeout = parse_timeout_secs(
            "CART_REQUEST_TIMEOUT_SECS",
            get_optional_env("CART_REQUEST_TIMEOUT_SECS"),
        )?;
        let storage_path =
            PathBuf::from(get_env_or_default("CART_STORAGE_PATH", DEFAULT_STORAGE_PATH));

        Ok(Self {
            api_base_url,
            session_token,
            request_timeout,
            storage_path,
        })
    }

    /// Configuration pointing at a base URL with defaults for everything
    /// else. Useful in tests and tools.
    #[must_use]
    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            session_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a timeout value in whole seconds, falling back to the default when
/// the variable is unset.
fn parse_timeout_secs(key: &str, value: Option<String>) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    };

    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeout_default() {
        let timeout = parse_timeout_secs("TEST_VAR", None).unwrap();
        assert_eq!(timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_parse_timeout_explicit() {
        let timeout = parse_timeout_secs("TEST_VAR", Some("30".to_string())).unwrap();
        assert_eq!(timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_timeout_invalid() {
        let result = parse_timeout_secs("TEST_VAR", Some("soon".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_debug_redacts_session_token() {
        let mut config = CartConfig::for_base_url("https://cart.example");
        config.session_token = Some(SecretString::from("super-secret-session"));

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://cart.example"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-session"));
    }
}
