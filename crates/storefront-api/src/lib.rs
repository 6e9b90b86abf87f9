// HTTP client for the remote product catalog
pub mod products;
pub mod retry;

// Re-export common types
pub use products::{ApiError, ApiProduct, ApiRating, CatalogClient};
pub use retry::RetryConfig;
