use crate::{cli::globals::GlobalArgs, APP_USER_AGENT};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, instrument};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("invalid cartId or cart does not exist")]
    InvalidCartId,
    #[error("commerce platform error: {0}")]
    Upstream(String),
}

/// One line item as the gating logic sees it. The commerce platform returns
/// far more per item; only the product code and quantity matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub quantity: i64,
}

/// A cart as fetched for one gating decision. Never cached.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    pub cart_id: String,
    pub items: Vec<CartItem>,
    /// The raw cart document, echoed back to the storefront on binding.
    pub document: Value,
}

impl CartSnapshot {
    /// Item SKUs normalized to uppercase for membership tests.
    #[must_use]
    pub fn skus_upper(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| !item.sku.is_empty())
            .map(|item| item.sku.to_uppercase())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CartDocument {
    data: CartData,
}

#[derive(Debug, Deserialize)]
struct CartData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    line_items: LineItems,
}

#[derive(Debug, Default, Deserialize)]
struct LineItems {
    #[serde(default)]
    physical_items: Vec<CartItem>,
    #[serde(default)]
    digital_items: Vec<CartItem>,
}

/// Boundary to the commerce platform's cart storage.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Look up a cart by id, returning a snapshot of its contents.
    ///
    /// # Errors
    /// `CartError::InvalidCartId` when the platform reports the cart as
    /// unknown, `CartError::Upstream` for transport or server failures.
    async fn validate(&self, cart_id: &str) -> Result<CartSnapshot, CartError>;
}

/// Reqwest-backed [`CartGateway`] for the commerce platform REST API.
#[derive(Debug, Clone)]
pub struct CommerceClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl CommerceClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(globals: &GlobalArgs) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: globals.commerce_url.trim_end_matches('/').to_string(),
            token: globals.commerce_token.clone(),
        })
    }
}

#[async_trait]
impl CartGateway for CommerceClient {
    #[instrument(skip(self))]
    async fn validate(&self, cart_id: &str) -> Result<CartSnapshot, CartError> {
        let url = format!("{}/carts/{cart_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", self.token.expose_secret())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching cart {cart_id}: {e}");
                CartError::Upstream(e.to_string())
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            error!("Invalid cartId: {cart_id}");
            return Err(CartError::InvalidCartId);
        }

        if !response.status().is_success() {
            let status = response.status();
            error!("Commerce API error for cart {cart_id}: {status}");
            return Err(CartError::Upstream(format!("commerce API status {status}")));
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| CartError::Upstream(e.to_string()))?;

        Ok(snapshot_from_document(cart_id, document))
    }
}

fn snapshot_from_document(cart_id: &str, document: Value) -> CartSnapshot {
    // Tolerate carts with no line items rather than failing the gate.
    let parsed: Option<CartDocument> = serde_json::from_value(document.clone()).ok();

    let (id, mut items) = match parsed {
        Some(doc) => {
            let mut items = doc.data.line_items.physical_items;
            items.extend(doc.data.line_items.digital_items);
            (doc.data.id, items)
        }
        None => (String::new(), Vec::new()),
    };

    items.retain(|item| !item.sku.is_empty());

    CartSnapshot {
        cart_id: if id.is_empty() {
            cart_id.to_string()
        } else {
            id
        },
        items,
        document,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_document() {
        let document = json!({
            "data": {
                "id": "cart-42",
                "line_items": {
                    "physical_items": [
                        { "sku": "beer01", "quantity": 2 },
                        { "sku": "TOY02", "quantity": 1 }
                    ],
                    "digital_items": [
                        { "sku": "GIFT03", "quantity": 1 }
                    ]
                }
            }
        });

        let snapshot = snapshot_from_document("cart-42", document);
        assert_eq!(snapshot.cart_id, "cart-42");
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(
            snapshot.skus_upper(),
            vec!["BEER01".to_string(), "TOY02".to_string(), "GIFT03".to_string()]
        );
    }

    #[test]
    fn test_snapshot_from_unexpected_document() {
        let snapshot = snapshot_from_document("cart-42", json!({ "unexpected": true }));
        assert_eq!(snapshot.cart_id, "cart-42");
        assert!(snapshot.items.is_empty());
        assert!(snapshot.skus_upper().is_empty());
    }

    #[test]
    fn test_skus_upper_skips_empty() {
        let snapshot = snapshot_from_document(
            "cart-42",
            json!({
                "data": {
                    "id": "cart-42",
                    "line_items": {
                        "physical_items": [
                            { "quantity": 1 },
                            { "sku": "abc123", "quantity": 1 }
                        ]
                    }
                }
            }),
        );
        assert_eq!(snapshot.skus_upper(), vec!["ABC123".to_string()]);
    }
}
