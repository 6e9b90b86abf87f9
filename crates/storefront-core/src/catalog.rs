// Catalog fetcher - one request per session, three observable states
use async_trait::async_trait;
use std::time::Duration;
use storefront_api::{CatalogClient, RetryConfig};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::models::Product;
use crate::notify::Notification;
use crate::Result;

/// Where products come from
///
/// The real thing is the REST API; tests swap in a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>>;
}

/// Bridges [`CatalogClient`] to [`CatalogSource`]
pub struct ApiCatalogSource {
    client: CatalogClient,
}

impl ApiCatalogSource {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = CatalogClient::with_options(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
            RetryConfig::with_max_retries(config.max_retries),
        )?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl CatalogSource for ApiCatalogSource {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let products = self.client.fetch_products().await?;
        Ok(products.into_iter().map(Product::from).collect())
    }
}

/// What the product grid can show right now
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogState {
    #[default]
    Pending,
    Failed(String),
    Ready(Vec<Product>),
}

impl CatalogState {
    /// Products to filter over; empty unless the fetch succeeded
    pub fn products(&self) -> &[Product] {
        match self {
            CatalogState::Ready(products) => products,
            CatalogState::Pending | CatalogState::Failed(_) => &[],
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CatalogState::Pending)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CatalogState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn find(&self, id: u64) -> Option<&Product> {
        self.products().iter().find(|p| p.id == id)
    }
}

/// The session's catalog
#[derive(Debug, Default)]
pub struct Catalog {
    state: CatalogState,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    /// Fetch once and settle into `Ready` or `Failed`
    ///
    /// No retry and no cache. A failure leaves the product list empty and
    /// hands back a notification for the user.
    pub async fn load(&mut self, source: &dyn CatalogSource) -> Option<Notification> {
        self.state = CatalogState::Pending;
        let (state, notification) = Self::fetch(source).await;
        self.state = state;
        notification
    }

    /// Run one fetch and describe its outcome without touching any state
    pub async fn fetch(source: &dyn CatalogSource) -> (CatalogState, Option<Notification>) {
        match source.fetch_products().await {
            Ok(products) => {
                info!("Catalog ready with {} products", products.len());
                (CatalogState::Ready(products), None)
            }
            Err(e) => {
                warn!("Catalog fetch failed: {}", e);
                let message = e.to_string();
                (
                    CatalogState::Failed(message.clone()),
                    Some(Notification::FetchFailed { message }),
                )
            }
        }
    }

    pub fn categories(&self) -> Vec<String> {
        crate::filter::categories(self.state.products())
    }
}
