// Filter -> sort over the in-memory catalog. Pure, no side effects.
use std::collections::BTreeSet;

use crate::models::Product;

pub const DEFAULT_PRICE_MIN: f64 = 0.0;
pub const DEFAULT_PRICE_MAX: f64 = 200.0;

/// Inclusive price bounds, always `min <= max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    /// Builds a range, swapping the ends if they come in backwards and
    /// flooring negatives at zero
    pub fn new(a: f64, b: f64) -> Self {
        let a = a.max(0.0);
        let b = b.max(0.0);
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }

    /// Narrow this range so it sits inside `bounds`
    pub fn clamp_to(&self, bounds: PriceRange) -> Self {
        let clamp = |v: f64| v.clamp(bounds.min, bounds.max);
        Self::new(clamp(self.min), clamp(self.max))
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_MIN, DEFAULT_PRICE_MAX)
    }
}

/// Star thresholds offered by the rating filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RatingThreshold {
    Three,
    Four,
    Five,
}

impl RatingThreshold {
    pub fn all() -> [RatingThreshold; 3] {
        [RatingThreshold::Three, RatingThreshold::Four, RatingThreshold::Five]
    }

    pub fn stars(&self) -> u8 {
        match self {
            RatingThreshold::Three => 3,
            RatingThreshold::Four => 4,
            RatingThreshold::Five => 5,
        }
    }

    pub fn from_stars(stars: u8) -> Option<Self> {
        match stars {
            3 => Some(RatingThreshold::Three),
            4 => Some(RatingThreshold::Four),
            5 => Some(RatingThreshold::Five),
            _ => None,
        }
    }

    /// "At most N stars". Selecting five therefore matches every product.
    pub fn matches(&self, rate: f64) -> bool {
        rate <= f64::from(self.stars())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::None => "None",
            SortOrder::Ascending => "Low to High",
            SortOrder::Descending => "High to Low",
        }
    }
}

/// Everything the listing is currently filtered and sorted by
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub selected_category: Option<String>,
    pub price_range: PriceRange,
    pub selected_ratings: BTreeSet<RatingThreshold>,
    pub sort_order: SortOrder,
    /// 1-based page into the filtered list
    pub current_page: usize,
    bounds: PriceRange,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::with_bounds(PriceRange::default())
    }
}

impl FilterState {
    /// Fresh state whose "full price range" is `bounds`
    pub fn with_bounds(bounds: PriceRange) -> Self {
        Self {
            selected_category: None,
            price_range: bounds,
            selected_ratings: BTreeSet::new(),
            sort_order: SortOrder::None,
            current_page: 1,
            bounds,
        }
    }

    pub fn bounds(&self) -> PriceRange {
        self.bounds
    }

    /// An empty category means "no category", same as clearing it
    pub fn set_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        self.selected_category = if category.is_empty() {
            None
        } else {
            Some(category)
        };
        self.current_page = 1;
    }

    pub fn clear_category(&mut self) {
        self.selected_category = None;
        self.current_page = 1;
    }

    pub fn set_price_range(&mut self, min: f64, max: f64) {
        self.price_range = PriceRange::new(min, max).clamp_to(self.bounds);
        self.current_page = 1;
    }

    pub fn toggle_rating(&mut self, rating: RatingThreshold) {
        if !self.selected_ratings.remove(&rating) {
            self.selected_ratings.insert(rating);
        }
        self.current_page = 1;
    }

    /// Picking the order that is already active turns sorting off
    pub fn toggle_sort(&mut self, order: SortOrder) {
        self.sort_order = if self.sort_order == order {
            SortOrder::None
        } else {
            order
        };
        self.current_page = 1;
    }

    /// Back to no category, full price range, no ratings, no sort
    pub fn reset(&mut self) {
        *self = Self::with_bounds(self.bounds);
    }

    pub fn is_default(&self) -> bool {
        *self == Self::with_bounds(self.bounds)
    }

    pub fn keeps(&self, product: &Product) -> bool {
        let category_ok = self
            .selected_category
            .as_deref()
            .map_or(true, |c| c == product.category);

        let rating_ok = self.selected_ratings.is_empty()
            || self
                .selected_ratings
                .iter()
                .any(|r| r.matches(product.rating.rate));

        category_ok && self.price_range.contains(product.price) && rating_ok
    }

    /// Filter then sort. Ties keep catalog order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut kept: Vec<&Product> = products.iter().filter(|p| self.keeps(p)).collect();

        // sort_by is stable, so equal prices stay in source order
        match self.sort_order {
            SortOrder::Ascending => kept.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortOrder::Descending => kept.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortOrder::None => {}
        }

        kept
    }
}

/// Distinct categories in the order the catalog first mentions them
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen = Vec::new();
    for product in products {
        if !seen.iter().any(|c: &String| *c == product.category) {
            seen.push(product.category.clone());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    fn product(id: u64, price: f64, category: &str, rate: f64) -> Product {
        Product {
            id,
            title: format!("Product {}", id),
            price,
            category: category.to_string(),
            description: String::new(),
            image: String::new(),
            rating: Rating { rate, count: 10 },
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, 109.95, "men's clothing", 3.9),
            product(2, 22.3, "men's clothing", 4.1),
            product(3, 695.0, "jewelery", 4.6),
            product(4, 9.85, "jewelery", 3.0),
            product(5, 64.0, "electronics", 3.3),
            product(6, 22.3, "electronics", 2.9),
            product(7, 7.95, "women's clothing", 4.8),
        ]
    }

    fn ids(list: &[&Product]) -> Vec<u64> {
        list.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_default_state_only_caps_price() {
        let products = catalog();
        let state = FilterState::default();
        // 695.00 is outside the default [0, 200] range
        assert_eq!(ids(&state.apply(&products)), vec![1, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn test_category_is_exact_match() {
        let products = catalog();
        let mut state = FilterState::default();
        state.set_category("clothing");
        assert!(state.apply(&products).is_empty());

        state.set_category("men's clothing");
        assert_eq!(ids(&state.apply(&products)), vec![1, 2]);
    }

    #[test]
    fn test_category_filter_is_idempotent() {
        let products = catalog();
        let mut state = FilterState::default();
        state.set_category("electronics");

        let once: Vec<Product> = state.apply(&products).into_iter().cloned().collect();
        let twice = state.apply(&once);
        assert_eq!(ids(&twice), vec![5, 6]);
    }

    #[test]
    fn test_empty_category_clears() {
        let mut state = FilterState::default();
        state.set_category("jewelery");
        state.set_category("");
        assert_eq!(state.selected_category, None);
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let products = catalog();
        let mut state = FilterState::default();
        state.set_price_range(22.3, 64.0);

        let kept = state.apply(&products);
        assert_eq!(ids(&kept), vec![2, 5, 6]);
        assert!(kept.iter().all(|p| 22.3 <= p.price && p.price <= 64.0));
    }

    #[test]
    fn test_price_range_is_ordered_and_clamped() {
        let mut state = FilterState::default();
        state.set_price_range(150.0, 30.0);
        assert_eq!(state.price_range, PriceRange::new(30.0, 150.0));

        state.set_price_range(-5.0, 900.0);
        assert_eq!(state.price_range.min(), 0.0);
        assert_eq!(state.price_range.max(), 200.0);
    }

    #[test]
    fn test_rating_threshold_is_at_most() {
        let products = catalog();
        let mut state = FilterState::default();

        state.toggle_rating(RatingThreshold::Three);
        // only products rated 3.0 or lower
        assert_eq!(ids(&state.apply(&products)), vec![4, 6]);

        state.toggle_rating(RatingThreshold::Four);
        // any selected threshold is enough
        assert_eq!(ids(&state.apply(&products)), vec![1, 4, 5, 6]);

        state.toggle_rating(RatingThreshold::Five);
        assert_eq!(state.apply(&products).len(), 6);
    }

    #[test]
    fn test_toggle_rating_removes_again() {
        let mut state = FilterState::default();
        state.toggle_rating(RatingThreshold::Four);
        state.toggle_rating(RatingThreshold::Four);
        assert!(state.selected_ratings.is_empty());
    }

    #[test]
    fn test_sort_ascending_is_stable() {
        let products = catalog();
        let mut state = FilterState::default();
        state.toggle_sort(SortOrder::Ascending);
        // 2 and 6 share a price and keep catalog order
        assert_eq!(ids(&state.apply(&products)), vec![7, 4, 2, 6, 5, 1]);
    }

    #[test]
    fn test_descending_reverses_ascending_for_distinct_prices() {
        let products: Vec<Product> = catalog().into_iter().filter(|p| p.id != 6).collect();
        let mut state = FilterState::default();

        state.toggle_sort(SortOrder::Ascending);
        let mut ascending = ids(&state.apply(&products));
        state.toggle_sort(SortOrder::Descending);
        let descending = ids(&state.apply(&products));

        ascending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_toggle_same_sort_turns_it_off() {
        let mut state = FilterState::default();
        state.toggle_sort(SortOrder::Descending);
        state.toggle_sort(SortOrder::Descending);
        assert_eq!(state.sort_order, SortOrder::None);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let products = catalog();
        let mut state = FilterState::default();
        state.set_category("jewelery");
        state.set_price_range(10.0, 40.0);
        state.toggle_rating(RatingThreshold::Five);
        state.toggle_sort(SortOrder::Ascending);
        state.current_page = 3;

        state.reset();

        assert_eq!(state.selected_category, None);
        assert_eq!(state.price_range, PriceRange::new(0.0, 200.0));
        assert!(state.selected_ratings.is_empty());
        assert_eq!(state.sort_order, SortOrder::None);
        assert_eq!(state.current_page, 1);
        assert!(state.is_default());

        let capped: Vec<u64> = products
            .iter()
            .filter(|p| p.price <= 200.0)
            .map(|p| p.id)
            .collect();
        assert_eq!(ids(&state.apply(&products)), capped);
    }

    #[test]
    fn test_filter_change_returns_to_first_page() {
        let mut state = FilterState::default();
        state.current_page = 2;
        state.toggle_rating(RatingThreshold::Three);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn test_categories_in_source_order() {
        assert_eq!(
            categories(&catalog()),
            vec!["men's clothing", "jewelery", "electronics", "women's clothing"]
        );
    }

    #[test]
    fn test_rating_threshold_from_stars() {
        assert_eq!(RatingThreshold::from_stars(4), Some(RatingThreshold::Four));
        assert_eq!(RatingThreshold::from_stars(2), None);
    }
}
