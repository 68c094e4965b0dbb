//! HTTP implementation of the remote cart service.
//!
//! REST/JSON against the cart API:
//!
//! - `GET    /cart`                 - full authoritative cart
//! - `POST   /cart/items`           - add `{ productId, quantity }`
//! - `PUT    /cart/items/{id}`      - set `{ quantity }`
//! - `DELETE /cart/items/{id}`      - remove line
//! - `POST   /cart/clear`           - empty the cart
//!
//! Mutating requests carry an `Idempotency-Key` UUID so a retried request
//! (client or proxy level) cannot double-apply. The session token is a
//! bearer credential held behind `secrecy` and installed by the
//! authentication layer via [`HttpCartClient::set_session`].

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use bramble_core::{LineItem, ProductId};

use super::{RemoteCart, RemoteError};
use crate::config::CartConfig;

/// Client for the remote cart service.
#[derive(Clone)]
pub struct HttpCartClient {
    inner: Arc<HttpCartClientInner>,
}

struct HttpCartClientInner {
    client: reqwest::Client,
    base_url: String,
    session: RwLock<Option<SecretString>>,
}

/// Wire shape of the cart resource.
#[derive(Debug, Deserialize)]
struct CartResponse {
    items: Vec<serde_json::Value>,
}

/// Error body the service sends on a refused mutation.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: String,
    #[serde(default)]
    available: Option<u32>,
    #[serde(default)]
    required: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    product_id: &'a str,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct SetQuantityBody {
    quantity: u32,
}

impl HttpCartClient {
    /// Create a client from configuration. The per-request timeout applies
    /// to every call; a request that exceeds it surfaces as a transient
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &CartConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCartClientInner {
                client,
                base_url: config.api_base_url.trim_end_matches('/').to_string(),
                session: RwLock::new(config.session_token.clone()),
            }),
        })
    }

    /// Install the session token for an authenticated user. Called by the
    /// authentication layer before the engine's login hook.
    pub fn set_session(&self, token: SecretString) {
        if let Ok(mut session) = self.inner.session.write() {
            *session = Some(token);
        }
    }

    /// Drop the session token on logout.
    pub fn clear_session(&self) {
        if let Ok(mut session) = self.inner.session.write() {
            *session = None;
        }
    }

    fn bearer(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .ok()
            .and_then(|session| {
                session
                    .as_ref()
                    .map(|token| format!("Bearer {}", token.expose_secret()))
            })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn item_url(&self, product_id: &ProductId) -> String {
        self.url(&format!(
            "/cart/items/{}",
            urlencoding::encode(product_id.as_str())
        ))
    }

    /// Send a request, mapping the response status into [`RemoteError`].
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        idempotent_intent: bool,
    ) -> Result<reqwest::Response, RemoteError> {
        // Without a session there is nothing to authorize against; fail
        // locally instead of burning a round trip on a guaranteed 401.
        let Some(bearer) = self.bearer() else {
            return Err(RemoteError::Unauthorized);
        };

        let mut request = request.header(reqwest::header::AUTHORIZATION, bearer);
        if idempotent_intent {
            request = request.header("Idempotency-Key", Uuid::new_v4().to_string());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }

        if status.is_success() {
            return Ok(response);
        }

        // Client errors may carry a structured refusal reason.
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(error) = serde_json::from_str::<ErrorBody>(&body)
                && error.reason == "insufficient_stock"
            {
                return Err(RemoteError::InsufficientStock {
                    available: error.available.unwrap_or(0),
                    required: error.required.unwrap_or(0),
                });
            }
        }

        Err(RemoteError::UnexpectedStatus(status.as_u16()))
    }
}

impl RemoteCart for HttpCartClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<LineItem>, RemoteError> {
        let request = self.inner.client.get(self.url("/cart"));
        let response = self.send(request, false).await?;
        let cart: CartResponse = response.json().await?;

        // Validate each wire line at the boundary. A structurally broken
        // line is dropped with a warning rather than poisoning the whole
        // pull; over-stock quantities are kept so checkout can surface them.
        let items = cart
            .items
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<LineItem>(value) {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!(error = %e, "dropping malformed cart line from remote");
                    None
                }
            })
            .filter(|line| {
                if line.product_id.is_empty() || line.quantity == 0 {
                    warn!(product_id = %line.product_id, quantity = line.quantity,
                        "dropping invalid cart line from remote");
                    return false;
                }
                true
            })
            .collect();

        Ok(items)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError> {
        let request = self
            .inner
            .client
            .post(self.url("/cart/items"))
            .json(&AddItemBody {
                product_id: product_id.as_str(),
                quantity,
            });
        self.send(request, true).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_item(&self, product_id: &ProductId) -> Result<(), RemoteError> {
        let request = self.inner.client.delete(self.item_url(product_id));
        self.send(request, true).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError> {
        let request = self
            .inner
            .client
            .put(self.item_url(product_id))
            .json(&SetQuantityBody { quantity });
        self.send(request, true).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), RemoteError> {
        let request = self.inner.client.post(self.url("/cart/clear"));
        self.send(request, true).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_body_wire_shape() {
        let body = AddItemBody {
            product_id: "p-1",
            quantity: 3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "productId": "p-1", "quantity": 3 }));
    }

    #[test]
    fn test_error_body_parses_insufficient_stock() {
        let body: ErrorBody = serde_json::from_str(
            r#"{ "reason": "insufficient_stock", "available": 1, "required": 2 }"#,
        )
        .unwrap();
        assert_eq!(body.reason, "insufficient_stock");
        assert_eq!(body.available, Some(1));
        assert_eq!(body.required, Some(2));
    }

    #[test]
    fn test_cart_response_tolerates_unknown_line_shapes() {
        let cart: CartResponse = serde_json::from_str(
            r#"{ "items": [ { "unexpected": true }, 42 ] }"#,
        )
        .unwrap();
        assert_eq!(cart.items.len(), 2);
    }
}
