//! # Stock Service Client
//!
//! The two remote reads the cart makes.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET {base}/stock/{id}      → { "id": 1, "amount": 3 }                  │
//! │                               (only `amount` is required)               │
//! │                                                                         │
//! │  GET {base}/products/{id}   → { "id": 1, "title": "...",                │
//! │                                 "price": 179.9, "image": "...", ... }   │
//! │                                                                         │
//! │  Non-2xx, connection failure, timeout, bad JSON → ApiError              │
//! │  No retries: the shopper clicks again.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rocketshoes_core::{ProductDetails, ProductId, StockRecord};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiSettings;
use crate::error::{ApiError, ApiResult};

/// Remote inventory and catalog reads.
///
/// Implemented over HTTP by [`HttpStockService`]; tests plug in fakes.
pub trait StockService: Send + Sync {
    /// Current stock for a product. Never cached.
    fn stock(&self, product_id: ProductId) -> impl Future<Output = ApiResult<StockRecord>> + Send;

    /// Display data for a product.
    fn product(&self, product_id: ProductId)
        -> impl Future<Output = ApiResult<ProductDetails>> + Send;
}

/// `reqwest` implementation of [`StockService`].
#[derive(Debug, Clone)]
pub struct HttpStockService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStockService {
    /// Creates a client for the service at `base_url`.
    ///
    /// `timeout` bounds each whole request, connect to last byte.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: expected an http(s) URL"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rocketshoes-cart/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(HttpStockService { client, base_url })
    }

    pub fn from_config(settings: &ApiSettings) -> ApiResult<Self> {
        Self::new(&settings.base_url, settings.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{resource}/{id}`, keeping any path prefix on the base.
    fn endpoint(&self, resource: &str, product_id: ProductId) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(resource)
            .push(&product_id.to_string());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl StockService for HttpStockService {
    async fn stock(&self, product_id: ProductId) -> ApiResult<StockRecord> {
        let url = self.endpoint("stock", product_id)?;
        self.get_json(url).await
    }

    async fn product(&self, product_id: ProductId) -> ApiResult<ProductDetails> {
        let url = self.endpoint("products", product_id)?;
        self.get_json(url).await
    }
}
