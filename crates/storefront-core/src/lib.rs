// Core storefront logic: catalog, filters, pagination and the cart
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod paginator;

pub use cart::{parse_cart, CartStore, CartValidationError, CART_STORAGE_KEY};
pub use catalog::{ApiCatalogSource, Catalog, CatalogSource, CatalogState};
pub use config::Config;
pub use error::Error;
pub use filter::{FilterState, PriceRange, RatingThreshold, SortOrder};
pub use models::{
    format_price, CartLine, Product, Rating, CARD_DESCRIPTION_CHARS, CARD_TITLE_CHARS,
    CART_TITLE_CHARS,
};
pub use notify::{Notification, NotificationLevel};
pub use paginator::{Paginator, PAGE_SIZE};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
