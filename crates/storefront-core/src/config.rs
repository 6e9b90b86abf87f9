use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::filter::PriceRange;

/// Main configuration structure
///
/// Loaded from `<config dir>/storefront/config.toml`, then CLI flags win.
/// Every field has a default so a missing or partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// XDG config dir on Linux, the platform equivalent elsewhere
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("storefront");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the shared cart storage lives unless overridden
    pub fn data_dir() -> crate::Result<PathBuf> {
        Ok(dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("storefront"))
    }

    pub fn storage_path(&self) -> crate::Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("storage.db")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Products endpoint lives at `{base_url}/products`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts for transient failures. 0 means fetch once.
    #[serde(default)]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    storefront_api::products::DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file shared by every open view; defaults to the data dir
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// How often views check for cart changes made elsewhere
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,
}

fn default_sync_interval_ms() -> u64 {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            sync_interval_ms: default_sync_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub price_min: f64,

    #[serde(default = "default_price_max")]
    pub price_max: f64,

    /// Step for the price slider
    #[serde(default = "default_price_step")]
    pub price_step: f64,
}

fn default_page_size() -> usize {
    crate::paginator::PAGE_SIZE
}

fn default_price_max() -> f64 {
    crate::filter::DEFAULT_PRICE_MAX
}

fn default_price_step() -> f64 {
    30.0
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            price_min: crate::filter::DEFAULT_PRICE_MIN,
            price_max: default_price_max(),
            price_step: default_price_step(),
        }
    }
}

impl CatalogConfig {
    pub fn price_bounds(&self) -> PriceRange {
        PriceRange::new(self.price_min, self.price_max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_mouse")]
    pub mouse_enabled: bool,

    /// How long a toast stays on screen
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
}

fn default_mouse() -> bool {
    true
}

fn default_toast_secs() -> u64 {
    3
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mouse_enabled: default_mouse(),
            toast_secs: default_toast_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://fakestoreapi.com");
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.catalog.page_size, 12);
        assert_eq!(config.catalog.price_bounds(), PriceRange::new(0.0, 200.0));
        assert_eq!(config.storage.sync_interval_ms, 500);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [api]
            base_url = "http://localhost:3000"

            [catalog]
            price_max = 1000.0
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.catalog.price_max, 1000.0);
        assert_eq!(config.catalog.page_size, 12);
        assert!(config.ui.mouse_enabled);
    }

    #[test]
    fn test_bad_toml_is_a_config_error() {
        let err = Config::from_toml("[api\nbase_url = 3").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }

    #[test]
    fn test_explicit_storage_path_wins() {
        let mut config = Config::default();
        config.storage.path = Some(PathBuf::from("/tmp/cart.db"));
        assert_eq!(config.storage_path().unwrap(), PathBuf::from("/tmp/cart.db"));
    }

    #[test]
    fn test_config_serialization() {
        let toml = toml::to_string(&Config::default()).unwrap();
        assert!(toml.contains("base_url"));
        assert!(toml.contains("page_size"));
    }
}
