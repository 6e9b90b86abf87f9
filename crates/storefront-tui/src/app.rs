// TUI application state and the actions keys map to
use std::time::{Duration, Instant};

use storefront_core::{
    filter::categories, CartStore, CatalogState, FilterState, Notification, Paginator, Product,
    RatingThreshold, SortOrder,
};
use storefront_storage::StorageEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Catalog, // Product listing with filters
    Cart,    // Cart lines and price details
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Grid,
}

/// One selectable row of the filter sidebar
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarItem {
    Reset,
    Category(Option<String>),
    PriceMin,
    PriceMax,
    Rating(RatingThreshold),
    Sort(SortOrder),
}

pub struct App {
    pub should_quit: bool,
    pub view: View,
    pub focus: Focus,
    pub catalog: CatalogState,
    pub filters: FilterState,
    pub paginator: Paginator,
    pub price_step: f64,
    pub sidebar_cursor: usize,
    pub grid_cursor: usize,
    pub cart: CartStore,
    pub cart_cursor: usize,
    pub toast: Option<(Notification, Instant)>,
    pub toast_ttl: Duration,
}

impl App {
    pub fn new(cart: CartStore, filters: FilterState, paginator: Paginator) -> Self {
        Self {
            should_quit: false,
            view: View::Catalog,
            focus: Focus::Grid,
            catalog: CatalogState::Pending,
            filters,
            paginator,
            price_step: 30.0,
            sidebar_cursor: 0,
            grid_cursor: 0,
            cart,
            cart_cursor: 0,
            toast: None,
            toast_ttl: Duration::from_secs(3),
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn show_catalog(&mut self) {
        self.view = View::Catalog;
    }

    pub fn show_cart(&mut self) {
        self.view = View::Cart;
        self.clamp_cart_cursor();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::Grid,
            Focus::Grid => Focus::Sidebar,
        };
    }

    // ----- catalog -----

    pub fn set_catalog(&mut self, state: CatalogState) {
        self.catalog = state;
        self.grid_cursor = 0;
        self.sidebar_cursor = self.sidebar_cursor.min(self.sidebar_items().len() - 1);
    }

    pub fn is_loading(&self) -> bool {
        self.catalog.is_pending()
    }

    pub fn filtered(&self) -> Vec<&Product> {
        self.filters.apply(self.catalog.products())
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered().len()
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages(self.filtered_count())
    }

    /// Products on the current page
    pub fn page_products(&self) -> Vec<&Product> {
        let filtered = self.filtered();
        self.paginator
            .page(&filtered, self.filters.current_page)
            .to_vec()
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.page_products().get(self.grid_cursor).copied()
    }

    pub fn next_product(&mut self) {
        let count = self.page_products().len();
        if count > 0 {
            self.grid_cursor = (self.grid_cursor + 1).min(count - 1);
        }
    }

    pub fn previous_product(&mut self) {
        self.grid_cursor = self.grid_cursor.saturating_sub(1);
    }

    pub fn next_page(&mut self) {
        let count = self.filtered_count();
        if self.paginator.next(&mut self.filters.current_page, count) {
            self.grid_cursor = 0;
        }
    }

    pub fn previous_page(&mut self) {
        let count = self.filtered_count();
        if self.paginator.previous(&mut self.filters.current_page, count) {
            self.grid_cursor = 0;
        }
    }

    pub fn go_to_page(&mut self, n: usize) {
        let count = self.filtered_count();
        if self.paginator.go_to(&mut self.filters.current_page, n, count) {
            self.grid_cursor = 0;
        }
    }

    pub fn add_selected_to_cart(&mut self) {
        if let Some(product) = self.selected_product().cloned() {
            self.cart.add(&product);
        }
    }

    // ----- sidebar -----

    pub fn sidebar_items(&self) -> Vec<SidebarItem> {
        let mut items = vec![SidebarItem::Reset, SidebarItem::Category(None)];
        items.extend(
            categories(self.catalog.products())
                .into_iter()
                .map(|c| SidebarItem::Category(Some(c))),
        );
        items.push(SidebarItem::PriceMin);
        items.push(SidebarItem::PriceMax);
        items.extend(RatingThreshold::all().into_iter().map(SidebarItem::Rating));
        items.push(SidebarItem::Sort(SortOrder::Ascending));
        items.push(SidebarItem::Sort(SortOrder::Descending));
        items
    }

    pub fn selected_sidebar_item(&self) -> Option<SidebarItem> {
        self.sidebar_items().get(self.sidebar_cursor).cloned()
    }

    pub fn next_sidebar_item(&mut self) {
        let count = self.sidebar_items().len();
        self.sidebar_cursor = (self.sidebar_cursor + 1).min(count - 1);
    }

    pub fn previous_sidebar_item(&mut self) {
        self.sidebar_cursor = self.sidebar_cursor.saturating_sub(1);
    }

    /// Enter/space on the highlighted sidebar row
    pub fn activate_sidebar_item(&mut self) {
        match self.selected_sidebar_item() {
            Some(SidebarItem::Reset) => self.reset_filters(),
            Some(SidebarItem::Category(Some(category))) => self.filters.set_category(category),
            Some(SidebarItem::Category(None)) => self.filters.clear_category(),
            Some(SidebarItem::Rating(rating)) => self.filters.toggle_rating(rating),
            Some(SidebarItem::Sort(order)) => self.filters.toggle_sort(order),
            Some(SidebarItem::PriceMin) | Some(SidebarItem::PriceMax) | None => return,
        }
        self.grid_cursor = 0;
    }

    /// Left/right on a price row moves that end of the range by one step
    pub fn adjust_price(&mut self, steps: i32) {
        let delta = self.price_step * f64::from(steps);
        let range = self.filters.price_range;
        match self.selected_sidebar_item() {
            Some(SidebarItem::PriceMin) => {
                let min = (range.min() + delta).min(range.max());
                self.filters.set_price_range(min, range.max());
            }
            Some(SidebarItem::PriceMax) => {
                let max = (range.max() + delta).max(range.min());
                self.filters.set_price_range(range.min(), max);
            }
            _ => return,
        }
        self.grid_cursor = 0;
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
        self.grid_cursor = 0;
    }

    // ----- cart -----

    pub fn selected_line_id(&self) -> Option<u64> {
        self.cart.lines().get(self.cart_cursor).map(|l| l.id())
    }

    pub fn next_line(&mut self) {
        if !self.cart.is_empty() {
            self.cart_cursor = (self.cart_cursor + 1).min(self.cart.len() - 1);
        }
    }

    pub fn previous_line(&mut self) {
        self.cart_cursor = self.cart_cursor.saturating_sub(1);
    }

    pub fn increase_selected(&mut self) {
        if let Some(id) = self.selected_line_id() {
            self.cart.increase(id);
        }
    }

    pub fn decrease_selected(&mut self) {
        if let Some(id) = self.selected_line_id() {
            self.cart.decrease(id);
            self.clamp_cart_cursor();
        }
    }

    pub fn remove_selected(&mut self) {
        if let Some(id) = self.selected_line_id() {
            self.cart.remove(id);
            self.clamp_cart_cursor();
        }
    }

    pub fn complete_order(&mut self) {
        if !self.cart.is_empty() {
            self.cart.complete_order();
            self.cart_cursor = 0;
        }
    }

    fn clamp_cart_cursor(&mut self) {
        self.cart_cursor = self.cart_cursor.min(self.cart.len().saturating_sub(1));
    }

    /// Another view touched storage; re-read the cart if it was ours
    pub fn on_storage_event(&mut self, event: &StorageEvent) {
        if self.cart.apply_storage_event(event) {
            self.clamp_cart_cursor();
        }
    }

    // ----- toasts -----

    pub fn notify(&mut self, notification: Notification) {
        self.toast = Some((notification, Instant::now()));
    }

    pub fn current_toast(&self) -> Option<&Notification> {
        self.toast.as_ref().map(|(n, _)| n)
    }

    /// Drop the toast once it has been up long enough
    pub fn expire_toast(&mut self, now: Instant) {
        if let Some((_, shown_at)) = &self.toast {
            if now.duration_since(*shown_at) >= self.toast_ttl {
                self.toast = None;
            }
        }
    }
}
