// Transient user-facing messages (the storefront's toasts)
use crate::models::truncate_chars;

/// How long a title may be inside an "added to cart" message
const ADDED_TITLE_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Side-channel feedback for the user. Never part of durable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    AddedToCart { title: String },
    QuantityUpdated { product_id: u64 },
    QuantityIncreased { title: String },
    QuantityDecreased { title: String },
    Removed,
    OrderCompleted,
    FetchFailed { message: String },
}

impl Notification {
    pub fn added(title: &str) -> Self {
        Notification::AddedToCart {
            title: truncate_chars(title, ADDED_TITLE_CHARS),
        }
    }

    pub fn level(&self) -> NotificationLevel {
        match self {
            Notification::FetchFailed { .. } => NotificationLevel::Error,
            _ => NotificationLevel::Success,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level() == NotificationLevel::Error
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::AddedToCart { title } => write!(f, "{} added to cart!", title),
            Notification::QuantityUpdated { .. } => write!(f, "Item quantity updated!"),
            Notification::QuantityIncreased { title } => {
                write!(f, "Increased quantity of \"{}\"!", title)
            }
            Notification::QuantityDecreased { title } => {
                write!(f, "Decreased quantity of \"{}\"!", title)
            }
            Notification::Removed => write!(f, "Item removed from cart!"),
            Notification::OrderCompleted => write!(f, "Order completed successfully!"),
            Notification::FetchFailed { message } => write!(f, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_truncates_title() {
        let n = Notification::added("Mens Casual Premium Slim Fit T-Shirts");
        assert_eq!(n.to_string(), "Mens Casual Premium  added to cart!");
    }

    #[test]
    fn test_levels() {
        assert_eq!(Notification::Removed.level(), NotificationLevel::Success);
        let failed = Notification::FetchFailed {
            message: "Network error".to_string(),
        };
        assert!(failed.is_error());
        assert_eq!(failed.to_string(), "Network error");
    }

    #[test]
    fn test_quantity_messages_quote_title() {
        let n = Notification::QuantityIncreased {
            title: "Mug".to_string(),
        };
        assert_eq!(n.to_string(), "Increased quantity of \"Mug\"!");
    }
}
