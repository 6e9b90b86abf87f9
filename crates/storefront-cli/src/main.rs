use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{
    format_price, ApiCatalogSource, CartStore, Catalog, CatalogSource, Config, Error,
    FilterState, Notification, Paginator, RatingThreshold, SortOrder, CARD_TITLE_CHARS,
};
use storefront_storage::{LocalStorage, StorageWatcher};
use storefront_tui::{App, RunOptions};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(version, about = "Terminal storefront: browse the catalog, keep a cart", long_about = None)]
struct Cli {
    /// Catalog API base URL (overrides the config file)
    #[arg(long, global = true, env = "STOREFRONT_API_URL")]
    api_url: Option<String>,

    /// Storage file shared by every storefront window
    #[arg(long, global = true, env = "STOREFRONT_STORAGE")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List catalog products with filters applied
    Products {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Lower end of the price range
        #[arg(long)]
        min_price: Option<f64>,

        /// Upper end of the price range
        #[arg(long)]
        max_price: Option<f64>,

        /// Star threshold (3, 4 or 5); repeat to combine
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(3..=5))]
        rating: Vec<u8>,

        /// Sort by price
        #[arg(short, long, value_enum)]
        sort: Option<SortArg>,

        /// Page to show (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
}

#[derive(clap::Subcommand)]
enum CartAction {
    /// Show cart lines and price details
    Show,
    /// Add a catalog product by id
    Add { id: u64 },
    /// Bump a line's quantity by one
    Increase { id: u64 },
    /// Lower a line's quantity by one (never below one)
    Decrease { id: u64 },
    /// Drop a line
    Remove { id: u64 },
    /// Complete the order and empty the cart
    Checkout,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Asc => SortOrder::Ascending,
            SortArg::Desc => SortOrder::Descending,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file
    init_logging(cli.command.is_none())?;

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(path) = cli.storage {
        config.storage.path = Some(path);
    }

    let storage_path = config.storage_path()?;
    if let Some(parent) = storage_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = Arc::new(LocalStorage::open(&storage_path)?);
    tracing::debug!("Using storage at {}", storage_path.display());

    match cli.command {
        Some(Commands::Products {
            category,
            min_price,
            max_price,
            rating,
            sort,
            page,
        }) => {
            let mut filters = FilterState::with_bounds(config.catalog.price_bounds());
            if let Some(category) = category {
                filters.set_category(category);
            }
            if min_price.is_some() || max_price.is_some() {
                let range = filters.price_range;
                filters.set_price_range(
                    min_price.unwrap_or(range.min()),
                    max_price.unwrap_or(range.max()),
                );
            }
            for stars in rating {
                if let Some(threshold) = RatingThreshold::from_stars(stars) {
                    filters.toggle_rating(threshold);
                }
            }
            if let Some(sort) = sort {
                filters.toggle_sort(sort.into());
            }

            let source = ApiCatalogSource::from_config(&config.api)?;
            list_products(&source, filters, Paginator::new(config.catalog.page_size), page)
                .await?;
        }
        Some(Commands::Cart { action }) => {
            let mut cart = CartStore::load(storage);
            let mut notifications = cart.notifications();

            match action.unwrap_or(CartAction::Show) {
                CartAction::Show => {}
                CartAction::Add { id } => {
                    let source = ApiCatalogSource::from_config(&config.api)?;
                    let mut catalog = Catalog::new();
                    if let Some(failure) = catalog.load(&source).await {
                        anyhow::bail!("{}", failure);
                    }
                    let product = catalog
                        .state()
                        .find(id)
                        .cloned()
                        .ok_or(Error::ProductNotFound(id))?;
                    cart.add(&product);
                }
                CartAction::Increase { id } => {
                    require_line(&cart, id)?;
                    cart.increase(id);
                }
                CartAction::Decrease { id } => {
                    require_line(&cart, id)?;
                    cart.decrease(id);
                }
                CartAction::Remove { id } => {
                    require_line(&cart, id)?;
                    cart.remove(id);
                }
                CartAction::Checkout => {
                    if cart.is_empty() {
                        println!("Your cart is empty.");
                        return Ok(());
                    }
                    cart.complete_order();
                }
            }

            print_notifications(&mut notifications);
            print_cart(&cart);
        }
        None => {
            let cart = CartStore::load(storage.clone());
            let mut app = App::new(
                cart,
                FilterState::with_bounds(config.catalog.price_bounds()),
                Paginator::new(config.catalog.page_size),
            );
            app.price_step = config.catalog.price_step;
            app.toast_ttl = Duration::from_secs(config.ui.toast_secs);

            let watcher = match StorageWatcher::new(storage) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!("Could not watch storage: {}", e);
                    None
                }
            };
            let source: Arc<dyn CatalogSource> =
                Arc::new(ApiCatalogSource::from_config(&config.api)?);

            storefront_tui::run_tui(
                app,
                RunOptions {
                    source,
                    watcher,
                    sync_interval: Duration::from_millis(config.storage.sync_interval_ms),
                    mouse_enabled: config.ui.mouse_enabled,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn init_logging(to_file: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront=info".into());

    if to_file {
        let log_dir = Config::data_dir()?;
        std::fs::create_dir_all(&log_dir)?;
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("storefront.log"))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(log_file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

async fn list_products(
    source: &dyn CatalogSource,
    mut filters: FilterState,
    pager: Paginator,
    page: usize,
) -> anyhow::Result<()> {
    let mut catalog = Catalog::new();
    if let Some(failure) = catalog.load(source).await {
        eprintln!("{}", failure);
        println!("No products found.");
        return Ok(());
    }

    let filtered = filters.apply(catalog.state().products());
    if filtered.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    let count = filtered.len();
    if page != filters.current_page && !pager.go_to(&mut filters.current_page, page, count) {
        anyhow::bail!(
            "Page {} is out of range (1-{})",
            page,
            pager.total_pages(count)
        );
    }

    for product in pager.page(&filtered, filters.current_page) {
        println!(
            "{:>4}  {:<20} {:>10}  {:.1}★  {}",
            product.id,
            product.short_title(CARD_TITLE_CHARS),
            format_price(product.price),
            product.rating.rate,
            product.category
        );
    }

    if pager.controls_visible(count) {
        println!(
            "\nPage {} of {} ({} products)",
            filters.current_page,
            pager.total_pages(count),
            count
        );
    } else {
        println!("\n{} products", count);
    }

    Ok(())
}

fn require_line(cart: &CartStore, id: u64) -> anyhow::Result<()> {
    if cart.get(id).is_none() {
        anyhow::bail!("Product {} is not in the cart", id);
    }
    Ok(())
}

fn print_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        if notification.is_error() {
            eprintln!("{}", notification);
        } else {
            println!("{}", notification);
        }
    }
}

fn print_cart(cart: &CartStore) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in cart.lines() {
        println!(
            "{:>4}  {:<20} x{:<3} {:>10}",
            line.id(),
            line.short_title(),
            line.quantity,
            format_price(line.subtotal())
        );
    }

    println!();
    println!(
        "Price ({} items): {}",
        cart.item_count(),
        format_price(cart.total())
    );
    println!("Delivery Charges: Free");
    println!(
        "Total Amount: {}",
        format_price(cart.total() + cart.delivery_fee())
    );
}
