//! HTTP client for the shop API.

use std::time::Duration;

use minishop_core::Product;
use reqwest::{Client, StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error payload.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Client for `GET /api/products` and `POST /api/purchase/{id}`.
pub struct ShopClient {
    client: Client,
    base_url: String,
}

impl ShopClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("minishop-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the full catalog.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] for any non-2xx response.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] when the body is not a product list.
    pub async fn fetch_products(&self) -> Result<Vec<Product>, ClientError> {
        let url = format!("{}/api/products", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response, "product list").await
    }

    /// Buys `qty` units of product `id` on the server and returns the updated product.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] with the server's message (`Invalid quantity`,
    ///   `Product not found`, `Not enough stock`, `Purchase failed`).
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] when the body is not a product.
    pub async fn purchase(&self, id: &str, qty: u32) -> Result<Product, ClientError> {
        let url = format!("{}/api/purchase/{id}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "qty": qty }))
            .send()
            .await?;
        Self::decode(response, &format!("purchase of {id}")).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ClientError::Deserialize {
            context: context.to_string(),
            source,
        })
    }
}

/// Pulls `error` out of an error payload, falling back to the status text.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
