//! Scrape configuration
//!
//! A [`Config`] names exactly one source of metrics, a URL or a file holding
//! a saved scrape, together with the limits applied while fetching it.

pub mod http;

use std::{path::PathBuf, time::Duration};

/// Default timeout of a scrape request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default ceiling on the size of a payload, 10 MiB
pub const DEFAULT_MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Configuration of a [`crate::scrape::Scraper`]
pub struct Config {
    /// URL to scrape
    pub scrape_url: Option<String>,
    /// File holding a saved scrape in the text format
    pub scrape_file: Option<PathBuf>,
    /// Timeout of each request, also sent to the target as a hint
    pub timeout: Duration,
    /// Payloads of this many bytes or more are refused
    pub max_body_size: u64,
    /// YAML file configuring the HTTP client, see [`http::HttpClientConfig`]
    pub http_config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scrape_url: None,
            scrape_file: None,
            timeout: DEFAULT_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            http_config_file: None,
        }
    }
}

impl Config {
    /// Scrape `url` with default limits
    #[must_use]
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            scrape_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Read the saved scrape at `path` with default limits
    #[must_use]
    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        Self {
            scrape_file: Some(path.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_body_size, 10_485_760);
        assert!(config.scrape_url.is_none() && config.scrape_file.is_none());

        let config = Config::for_url("http://localhost:9090/metrics");
        assert_eq!(config.scrape_url.as_deref(), Some("http://localhost:9090/metrics"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
