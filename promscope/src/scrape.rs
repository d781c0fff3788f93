//! Scrape a target and analyze what it exposes
//!
//! A URL is fetched twice, concurrently. The first request prefers the
//! protobuf format, which alone carries created timestamps and native
//! histograms, and feeds the statistics. The second asks only for text
//! formats so that every family can be shown to a user as the target wrote
//! it. Both must succeed for the scrape to succeed.

pub mod protocol;
pub mod source;
pub mod text;

use std::path::{Path, PathBuf};

use reqwest::{RequestBuilder, header::InvalidHeaderValue};
use tracing::info;

use crate::{
    config::{
        Config,
        http::{self, HttpClientConfig, HttpTransport},
    },
    series::{SeriesMap, aggregate::extract_series},
};

use self::{
    protocol::{DISPLAY_PROTOCOLS, STATISTICS_PROTOCOLS, ScrapeProtocol, scrape_headers},
    text::{SeriesScrapeText, extract_series_text},
};

/// Content type assumed for payloads read from a file
const FILE_CONTENT_TYPE: &str = "text/plain";

/// Errors produced by [`Scraper`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Both a URL and a file were configured
    #[error("Only one of a scrape URL and a scrape file may be configured")]
    MutuallyExclusiveSource,
    /// Neither a URL nor a file was configured
    #[error("Neither a scrape URL nor a scrape file is configured")]
    NoSourceConfigured,
    /// The payload could not be read
    #[error("Failed to read scrape payload: {0}")]
    Source(#[from] source::Error),
    /// The payload could not be parsed
    #[error("Failed to extract metrics: {0}")]
    Parse(#[from] promscope_exposition::Error),
    /// The HTTP client configuration could not be loaded
    #[error("Failed to load HTTP configuration file {path:?}: {source}")]
    HttpConfig {
        /// Configuration file path
        path: PathBuf,
        /// Underlying configuration error
        #[source]
        source: Box<http::Error>,
    },
    /// A request header could not be built
    #[error("Invalid request header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

/// Everything learned from one scrape
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeResult {
    /// Series grouped by family
    pub series: SeriesMap,
    /// Content type of the payload the statistics were computed from
    pub used_content_type: String,
    /// Raw text of each family
    pub series_scrape_text: SeriesScrapeText,
}

/// Runs scrapes as described by a [`Config`]
#[derive(Debug)]
pub struct Scraper {
    config: Config,
}

impl Scraper {
    /// Create a new [`Scraper`]
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scrape the configured source once.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not name exactly one source, or if
    /// reading or parsing the payload fails. For a URL, a failure of either
    /// request fails the scrape.
    pub async fn scrape(&self) -> Result<ScrapeResult, Error> {
        match (&self.config.scrape_url, &self.config.scrape_file) {
            (Some(_), Some(_)) => Err(Error::MutuallyExclusiveSource),
            (None, None) => Err(Error::NoSourceConfigured),
            (None, Some(path)) => self.scrape_file(path).await,
            (Some(url), None) => self.scrape_http(url).await,
        }
    }

    async fn scrape_file(&self, path: &Path) -> Result<ScrapeResult, Error> {
        let body = source::read_file(path, self.config.max_body_size).await?;
        let series = extract_series(&body, FILE_CONTENT_TYPE)?;
        let series_scrape_text = extract_series_text(&body);
        info!(
            path = %path.display(),
            families = series.len(),
            series = series.total_series(),
            "scraped metrics file"
        );

        Ok(ScrapeResult {
            series,
            used_content_type: FILE_CONTENT_TYPE.to_string(),
            series_scrape_text,
        })
    }

    async fn scrape_http(&self, url: &str) -> Result<ScrapeResult, Error> {
        let transport = match &self.config.http_config_file {
            Some(path) => HttpClientConfig::load(path)
                .and_then(HttpClientConfig::into_transport)
                .map_err(|source| Error::HttpConfig {
                    path: path.clone(),
                    source: Box::new(source),
                })?,
            None => HttpTransport::default(),
        };

        let statistics = async {
            let response = self
                .request(&transport, url, STATISTICS_PROTOCOLS)?
                .send()
                .await
                .map_err(source::Error::from)?;
            let (content_type, body) =
                source::read_response(response, self.config.max_body_size).await?;
            let series = extract_series(&body, &content_type)?;
            Ok::<_, Error>((content_type, series))
        };
        let display = async {
            let response = self
                .request(&transport, url, DISPLAY_PROTOCOLS)?
                .send()
                .await
                .map_err(source::Error::from)?;
            let (_, body) = source::read_response(response, self.config.max_body_size).await?;
            Ok::<_, Error>(extract_series_text(&body))
        };

        let ((used_content_type, series), series_scrape_text) =
            tokio::try_join!(statistics, display)?;
        info!(
            url,
            content_type = %used_content_type,
            families = series.len(),
            series = series.total_series(),
            "scraped metrics endpoint"
        );

        Ok(ScrapeResult {
            series,
            used_content_type,
            series_scrape_text,
        })
    }

    fn request(
        &self,
        transport: &HttpTransport,
        url: &str,
        protocols: &[ScrapeProtocol],
    ) -> Result<RequestBuilder, Error> {
        let headers = scrape_headers(protocols, self.config.timeout)?;
        Ok(transport
            .get(url)
            .headers(headers)
            .timeout(self.config.timeout))
    }
}
