//! Service configuration.

use std::path::PathBuf;

use crate::cache::DEFAULT_CAPACITY;

/// Configuration for wiring up the patch service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the remote static file provider, if any.
    pub data_url: Option<String>,
    /// Directory of the local persistent store; platform default if unset.
    pub data_dir: Option<PathBuf>,
    /// Render-tile cache capacity.
    pub cache_capacity: usize,
    /// HTTP timeout for the static provider, in seconds.
    pub http_timeout_secs: u64,
    /// Name of the site selected at startup.
    pub primary_site: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_url: None,
            data_dir: None,
            cache_capacity: DEFAULT_CAPACITY,
            http_timeout_secs: 30,
            primary_site: "World".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote static provider base URL.
    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = Some(url.into());
        self
    }

    /// Set the local store directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the render-tile cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the HTTP timeout in seconds.
    pub fn with_http_timeout(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    /// Set the site selected at startup.
    pub fn with_primary_site(mut self, site: impl Into<String>) -> Self {
        self.primary_site = site.into();
        self
    }
}
