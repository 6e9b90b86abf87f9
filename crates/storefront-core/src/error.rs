use thiserror::Error;

/// Everything that can go wrong in the storefront core
///
/// Nothing here is fatal to a session: callers degrade to an empty catalog
/// or an empty cart and keep going.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog fetch failed: {0}")]
    ApiError(#[from] storefront_api::ApiError),

    #[error("Storage operation failed: {0}")]
    StorageError(#[from] storefront_storage::StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
