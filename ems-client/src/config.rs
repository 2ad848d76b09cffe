//! Client configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | EMS_API_BASE_URL | http://localhost:8000/api | Backend base URL |
//! | EMS_APP_URL | http://localhost:5173/ | Origin of in-app URLs (`/login`, `/employees`) |
//! | EMS_DATA_DIR | .ems | Directory of the file-backed store |
//! | EMS_REQUEST_TIMEOUT_SECS | 30 | HTTP timeout |
//! | EMS_PER_PAGE | 10 | Employee list page size |
//! | EMS_QUERY_STALE_SECS | 30 | Default freshness window of cached queries |
//! | EMS_QUERY_RETRY | 0 | Query retry count |
//! | EMS_QUERY_MAX_ENTRIES | (unset) | Optional LRU cap on cached queries |
//! | EMS_SEARCH_DEBOUNCE_MS | 300 | Search input debounce |

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::QueryConfig;

/// Client configuration for connecting to the EMS backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "http://localhost:8000/api")
    pub base_url: String,

    /// Origin used to build in-app locations such as `/login`
    pub app_url: String,

    /// Directory of the persistent key-value store
    pub data_dir: PathBuf,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Employee list page size
    pub per_page: u32,

    /// Default freshness window of cached queries
    pub stale_time: Duration,

    /// Query retry count
    pub retry: u32,

    /// Optional cap on cached query entries
    pub max_cache_entries: Option<usize>,

    /// Search input debounce
    pub search_debounce: Duration,
}

impl ClientConfig {
    /// Create a new configuration with defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            app_url: "http://localhost:5173/".into(),
            data_dir: PathBuf::from(".ems"),
            timeout: 30,
            per_page: shared::request::DEFAULT_PER_PAGE,
            stale_time: Duration::from_secs(30),
            retry: 0,
            max_cache_entries: None,
            search_debounce: Duration::from_millis(300),
        }
    }

    /// Load configuration from the environment
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("EMS_API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000/api".into()),
        );
        if let Ok(url) = std::env::var("EMS_APP_URL") {
            config.app_url = url;
        }
        if let Ok(dir) = std::env::var("EMS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = env_parse("EMS_REQUEST_TIMEOUT_SECS") {
            config.timeout = timeout;
        }
        if let Some(per_page) = env_parse::<u32>("EMS_PER_PAGE").filter(|p| *p > 0) {
            config.per_page = per_page;
        }
        if let Some(secs) = env_parse("EMS_QUERY_STALE_SECS") {
            config.stale_time = Duration::from_secs(secs);
        }
        if let Some(retry) = env_parse("EMS_QUERY_RETRY") {
            config.retry = retry;
        }
        config.max_cache_entries = env_parse("EMS_QUERY_MAX_ENTRIES");
        if let Some(ms) = env_parse("EMS_SEARCH_DEBOUNCE_MS") {
            config.search_debounce = Duration::from_millis(ms);
        }
        config
    }

    /// Set the in-app origin
    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = url.into();
        self
    }

    /// Set the store directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the list page size
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Set the cache freshness window
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Set the search debounce
    pub fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    /// Query cache settings derived from this configuration
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            stale_time: self.stale_time,
            retry: self.retry,
            max_entries: self.max_cache_entries,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api")
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
