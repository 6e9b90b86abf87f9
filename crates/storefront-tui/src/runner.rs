// TUI event loop and terminal management
use crate::app::{App, Focus, View};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_core::{Catalog, CatalogSource, CART_STORAGE_KEY};
use storefront_storage::StorageWatcher;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

const TICK: Duration = Duration::from_millis(100);

/// Everything the loop needs besides the app state
pub struct RunOptions {
    pub source: Arc<dyn CatalogSource>,
    pub watcher: Option<StorageWatcher>,
    pub sync_interval: Duration,
    pub mouse_enabled: bool,
}

pub async fn run_tui(mut app: App, options: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        source,
        watcher,
        sync_interval,
        mouse_enabled,
    } = options;

    // Fetch the catalog in the background; filters and cart stay usable meanwhile
    let (fetch_tx, mut fetch_rx) = oneshot::channel();
    tokio::spawn(async move {
        let outcome = Catalog::fetch(source.as_ref()).await;
        let _ = fetch_tx.send(outcome);
    });

    // Cart changes made by other views
    let mut storage_events = match watcher {
        Some(mut watcher) => match watcher.subscribe(CART_STORAGE_KEY) {
            Ok(rx) => {
                tokio::spawn(watcher.run(sync_interval));
                Some(rx)
            }
            Err(e) => {
                warn!("Cross-view cart sync disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let mut notifications = app.cart.notifications();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if mouse_enabled {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    } else {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = loop {
        if app.is_loading() {
            if let Ok((state, notification)) = fetch_rx.try_recv() {
                app.set_catalog(state);
                if let Some(notification) = notification {
                    app.notify(notification);
                }
            }
        }

        if let Some(rx) = storage_events.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(event) => app.on_storage_event(&event),
                    // Missed a few; one re-read catches up
                    Err(broadcast::error::TryRecvError::Lagged(n)) => {
                        debug!("Skipped {} storage events", n);
                        app.cart.sync_from_storage();
                    }
                    Err(_) => break,
                }
            }
        }

        while let Ok(notification) = notifications.try_recv() {
            app.notify(notification);
        }
        app.expire_toast(Instant::now());

        if let Err(e) = terminal.draw(|f| crate::ui::render(f, &app)) {
            break Err(e.into());
        }

        match event::poll(TICK) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    if mouse_enabled {
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

/// Map one key press onto the app
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('q') {
        app.quit();
        return;
    }

    match app.view {
        View::Catalog => match (app.focus, key.code) {
            (_, KeyCode::Tab) => app.toggle_focus(),
            (_, KeyCode::Char('c')) => app.show_cart(),
            (_, KeyCode::Char('r')) => app.reset_filters(),
            (_, KeyCode::Char(']')) | (_, KeyCode::PageDown) => app.next_page(),
            (_, KeyCode::Char('[')) | (_, KeyCode::PageUp) => app.previous_page(),
            (_, KeyCode::Char(d)) if d.is_ascii_digit() && d != '0' => {
                app.go_to_page(d as usize - '0' as usize)
            }

            (Focus::Sidebar, KeyCode::Down | KeyCode::Char('j')) => app.next_sidebar_item(),
            (Focus::Sidebar, KeyCode::Up | KeyCode::Char('k')) => app.previous_sidebar_item(),
            (Focus::Sidebar, KeyCode::Enter | KeyCode::Char(' ')) => app.activate_sidebar_item(),
            (Focus::Sidebar, KeyCode::Left | KeyCode::Char('h')) => app.adjust_price(-1),
            (Focus::Sidebar, KeyCode::Right | KeyCode::Char('l')) => app.adjust_price(1),

            (Focus::Grid, KeyCode::Right | KeyCode::Down | KeyCode::Char('l' | 'j')) => {
                app.next_product()
            }
            (Focus::Grid, KeyCode::Left | KeyCode::Up | KeyCode::Char('h' | 'k')) => {
                app.previous_product()
            }
            (Focus::Grid, KeyCode::Enter | KeyCode::Char('a')) => app.add_selected_to_cart(),
            _ => {}
        },
        View::Cart => match key.code {
            KeyCode::Esc | KeyCode::Char('p') => app.show_catalog(),
            KeyCode::Down | KeyCode::Char('j') => app.next_line(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_line(),
            KeyCode::Char('+') | KeyCode::Char('=') => app.increase_selected(),
            KeyCode::Char('-') => app.decrease_selected(),
            KeyCode::Char('x') | KeyCode::Delete => app.remove_selected(),
            KeyCode::Char('o') => app.complete_order(),
            _ => {}
        },
    }
}
