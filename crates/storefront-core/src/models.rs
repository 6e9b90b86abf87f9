use serde::{Deserialize, Serialize};
use storefront_api::{ApiProduct, ApiRating};

/// Title length on a product card
pub const CARD_TITLE_CHARS: usize = 18;
/// Description length on a product card
pub const CARD_DESCRIPTION_CHARS: usize = 45;
/// Title length on a cart line
pub const CART_TITLE_CHARS: usize = 20;

/// A catalog item - read-only, owned by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

/// Average review score (0-5) and how many reviews produced it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u32,
}

impl From<ApiRating> for Rating {
    fn from(r: ApiRating) -> Self {
        Self {
            rate: r.rate,
            count: r.count,
        }
    }
}

impl From<ApiProduct> for Product {
    fn from(p: ApiProduct) -> Self {
        Self {
            id: p.id,
            title: p.title,
            price: p.price,
            category: p.category,
            description: p.description,
            image: p.image,
            rating: p.rating.into(),
        }
    }
}

impl Product {
    /// Title cut down for cards and toasts
    pub fn short_title(&self, max_chars: usize) -> String {
        truncate_chars(&self.title, max_chars)
    }

    pub fn short_description(&self, max_chars: usize) -> String {
        truncate_chars(&self.description, max_chars)
    }
}

/// One product in the cart
///
/// Serialized flat - the product's own fields plus `quantity` - which is the
/// shape persisted under the cart storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    pub fn id(&self) -> u64 {
        self.product.id
    }

    pub fn title(&self) -> &str {
        &self.product.title
    }

    /// Title as the cart shows it
    pub fn short_title(&self) -> String {
        self.product.short_title(CART_TITLE_CHARS)
    }

    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Render an amount the way the storefront shows prices
pub fn format_price(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
