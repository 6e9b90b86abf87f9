use std::sync::Arc;

use storefront_core::{
    CartStore, FilterState, Paginator, Product, Rating, RatingThreshold, SortOrder,
    CART_STORAGE_KEY,
};
use storefront_storage::{KeyValueStore, LocalStorage, StorageWatcher};
use tempfile::TempDir;

fn create_test_product(id: u64, price: f64, category: &str, rate: f64) -> Product {
    Product {
        id,
        title: format!("Test product {}", id),
        price,
        category: category.to_string(),
        description: format!("Description for product {}", id),
        image: format!("https://example.com/{}.jpg", id),
        rating: Rating { rate, count: 50 },
    }
}

fn catalog_of(n: u64) -> Vec<Product> {
    (1..=n)
        .map(|id| {
            let category = if id % 2 == 0 { "electronics" } else { "jewelery" };
            create_test_product(id, id as f64 * 5.0, category, 2.5 + (id % 5) as f64 * 0.5)
        })
        .collect()
}

fn shared_file() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.db");
    (dir, path)
}

#[test]
fn test_browse_twenty_five_products() {
    let products = catalog_of(25);
    let state = FilterState::default();
    let pager = Paginator::default();

    let filtered = state.apply(&products);
    assert_eq!(filtered.len(), 25);
    assert_eq!(pager.total_pages(filtered.len()), 3);
    assert!(pager.controls_visible(filtered.len()));

    let first: Vec<u64> = pager.page(&filtered, 1).iter().map(|p| p.id).collect();
    assert_eq!(first, (1..=12).collect::<Vec<_>>());

    let last: Vec<u64> = pager.page(&filtered, 3).iter().map(|p| p.id).collect();
    assert_eq!(last, vec![25]);
}

#[test]
fn test_filters_compose_before_paging() {
    let products = catalog_of(25);
    let mut state = FilterState::default();
    state.set_category("electronics");
    state.set_price_range(20.0, 100.0);
    state.toggle_rating(RatingThreshold::Four);
    state.toggle_sort(SortOrder::Descending);

    let filtered = state.apply(&products);
    assert!(!filtered.is_empty());
    for product in &filtered {
        assert_eq!(product.category, "electronics");
        assert!(20.0 <= product.price && product.price <= 100.0);
        assert!(product.rating.rate <= 4.0);
    }
    assert!(filtered.windows(2).all(|w| w[0].price >= w[1].price));

    let pager = Paginator::default();
    assert!(!pager.controls_visible(filtered.len()));
}

#[test]
fn test_cart_survives_restart_on_disk() {
    let (_dir, path) = shared_file();
    let products = catalog_of(3);

    {
        let storage = Arc::new(LocalStorage::open(&path).unwrap());
        let mut cart = CartStore::load(storage);
        cart.add(&products[0]);
        cart.add(&products[0]);
        cart.add(&products[2]);
    }

    let storage = Arc::new(LocalStorage::open(&path).unwrap());
    let cart = CartStore::load(storage);
    let pairs: Vec<(u64, u32)> = cart.lines().iter().map(|l| (l.id(), l.quantity)).collect();
    assert_eq!(pairs, vec![(1, 2), (3, 1)]);
    assert_eq!(format!("{:.2}", cart.total()), "25.00");
}

#[test]
fn test_cart_view_follows_catalog_view() {
    let (_dir, path) = shared_file();
    let products = catalog_of(2);

    // catalog view
    let catalog_storage = Arc::new(LocalStorage::open(&path).unwrap());
    let mut catalog_cart = CartStore::load(catalog_storage);

    // cart view, watching for changes made elsewhere
    let cart_storage = Arc::new(LocalStorage::open(&path).unwrap());
    let mut cart_view = CartStore::load(cart_storage.clone());
    let mut watcher = StorageWatcher::new(cart_storage).unwrap();
    let mut events = watcher.subscribe(CART_STORAGE_KEY).unwrap();

    catalog_cart.add(&products[1]);
    assert_eq!(watcher.poll().unwrap(), 1);

    let event = events.try_recv().unwrap();
    assert!(cart_view.apply_storage_event(&event));
    assert_eq!(cart_view.get(2).unwrap().quantity, 1);

    // the cart view's own writes never echo back to itself
    cart_view.increase(2);
    assert_eq!(watcher.poll().unwrap(), 0);

    // but the catalog view sees them after a re-read
    catalog_cart.sync_from_storage();
    assert_eq!(catalog_cart.get(2).unwrap().quantity, 2);

    // checkout in one view empties the other
    cart_view.complete_order();
    catalog_cart.sync_from_storage();
    assert!(catalog_cart.is_empty());
}

#[test]
fn test_corrupt_entry_written_by_another_view() {
    let (_dir, path) = shared_file();
    let other = LocalStorage::open(&path).unwrap();
    other
        .set_item(CART_STORAGE_KEY, r#"[{"id": 1, "title": "no price", "quantity": 1}]"#)
        .unwrap();

    let storage = Arc::new(LocalStorage::open(&path).unwrap());
    let cart = CartStore::load(storage);

    assert!(cart.is_empty());
    assert_eq!(other.get_item(CART_STORAGE_KEY).unwrap(), None);
}

#[test]
fn test_checkout_elsewhere_empties_this_view() {
    let (_dir, path) = shared_file();
    let products = catalog_of(1);

    let storage = Arc::new(LocalStorage::open(&path).unwrap());
    let mut view = CartStore::load(storage.clone());
    let mut watcher = StorageWatcher::new(storage).unwrap();
    let mut events = watcher.subscribe(CART_STORAGE_KEY).unwrap();

    view.add(&products[0]);

    let mut other = CartStore::load(Arc::new(LocalStorage::open(&path).unwrap()));
    assert_eq!(other.len(), 1);
    other.complete_order();

    assert_eq!(watcher.poll().unwrap(), 1);
    while let Ok(event) = events.try_recv() {
        view.apply_storage_event(&event);
    }
    assert!(view.is_empty());

    // the next change here must not resurrect the checked-out line
    view.add(&products[0]);
    let reread = CartStore::load(Arc::new(LocalStorage::open(&path).unwrap()));
    assert_eq!(reread.get(1).unwrap().quantity, 1);
}
