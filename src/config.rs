//! Engine configuration.
//!
//! Defaults match the catalog page: 12 items per page, 400 ms debounce and
//! a 200 px scroll proximity margin. Values can be overridden with the
//! builder methods or read from the environment with
//! [`CatalogConfig::from_env`].

use std::time::Duration;

use crate::error::ConfigError;
use crate::query::LIST_PATH;

pub const DEFAULT_API_BASE: &str = "http://localhost:3000";
pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);
pub const DEFAULT_SCROLL_MARGIN_PX: f64 = 200.0;

pub const ENV_API_BASE: &str = "CATALOG_API_BASE";
pub const ENV_PAGE_SIZE: &str = "CATALOG_PAGE_SIZE";
pub const ENV_DEBOUNCE_MS: &str = "CATALOG_DEBOUNCE_MS";
pub const ENV_SCROLL_MARGIN_PX: &str = "CATALOG_SCROLL_MARGIN_PX";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CATALOG_REQUEST_TIMEOUT_MS";

/// Configuration shared by the catalog, its coordinator and transports.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Base URL of the product service.
    pub api_base: String,
    /// Path of the listing endpoint.
    pub list_path: String,
    /// Items revealed per page.
    pub page_size: usize,
    /// Quiet interval before a typed query takes effect.
    pub debounce: Duration,
    /// How close (in px) the sentinel must be to the viewport to count as visible.
    pub scroll_margin_px: f64,
    /// Per-request timeout handed to the HTTP client. `None` leaves it unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            list_path: LIST_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            scroll_margin_px: DEFAULT_SCROLL_MARGIN_PX,
            request_timeout: None,
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            config.api_base = base.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            config.page_size = parse::<usize>(ENV_PAGE_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            config.debounce = Duration::from_millis(parse::<u64>(ENV_DEBOUNCE_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_SCROLL_MARGIN_PX) {
            config.scroll_margin_px = parse::<f64>(ENV_SCROLL_MARGIN_PX, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            let ms = parse::<u64>(ENV_REQUEST_TIMEOUT_MS, &raw)?;
            config.request_timeout = Some(Duration::from_millis(ms));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_list_path(mut self, list_path: impl Into<String>) -> Self {
        self.list_path = list_path.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_scroll_margin(mut self, px: f64) -> Self {
        self.scroll_margin_px = px;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Check invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::OutOfRange {
                key: ENV_PAGE_SIZE.to_string(),
                reason: "page size must be at least 1".to_string(),
            });
        }
        if !self.scroll_margin_px.is_finite() || self.scroll_margin_px < 0.0 {
            return Err(ConfigError::OutOfRange {
                key: ENV_SCROLL_MARGIN_PX.to_string(),
                reason: "margin must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
