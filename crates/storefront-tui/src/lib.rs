// Terminal UI implementation using ratatui
// Catalog grid, filter sidebar and the cart, all in one window

pub mod app;
pub mod runner;
pub mod ui;

pub use app::{App, Focus, SidebarItem, View};
pub use runner::{run_tui, RunOptions};
