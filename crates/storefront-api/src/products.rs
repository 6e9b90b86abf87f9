use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::retry::{is_retryable_status, with_retry, RetryConfig};

pub const DEFAULT_API_BASE: &str = "https://fakestoreapi.com";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimitExceeded => true,
            ApiError::NetworkError(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(is_retryable_status)
            }
            ApiError::RequestFailed(_) | ApiError::ParseError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Product record exactly as the catalog endpoint returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiProduct {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub category: String,
    pub description: String,
    pub image: String,
    pub rating: ApiRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApiRating {
    pub rate: f64,
    pub count: u32,
}

pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl CatalogClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE.to_string())
    }

    /// Point the client at another deployment of the same API
    pub fn with_base_url(base_url: String) -> Result<Self> {
        Self::with_options(
            base_url,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            RetryConfig::default(),
        )
    }

    pub fn with_options(
        base_url: String,
        timeout: Duration,
        retry_config: RetryConfig,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Storefront/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    /// Fetch the whole catalog in one request
    ///
    /// The endpoint takes no query parameters; filtering happens client-side.
    pub async fn fetch_products(&self) -> Result<Vec<ApiProduct>> {
        let url = self.products_url();
        debug!("GET {}", url);

        let products = with_retry(&self.retry_config, ApiError::is_retryable, || async {
            let response = self.client.get(&url).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ApiError::RateLimitExceeded);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::RequestFailed(format!("Status {}: {}", status, body)));
            }

            let body = response.text().await?;
            parse_products(&body)
        })
        .await?;

        info!("Fetched {} products from {}", products.len(), self.base_url);
        Ok(products)
    }
}

/// Decode the endpoint's JSON array body
pub fn parse_products(body: &str) -> Result<Vec<ApiProduct>> {
    Ok(serde_json::from_str(body)?)
}
