//! Content negotiation for scrape requests

use std::{fmt, time::Duration};

use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue,
};

/// Header through which Prometheus tells targets how long it will wait
pub static SCRAPE_TIMEOUT_HEADER: HeaderName =
    HeaderName::from_static("x-prometheus-scrape-timeout-seconds");

/// An exposition protocol a target may answer with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeProtocol {
    /// Delimited protobuf `MetricFamily` messages
    PrometheusProto,
    /// Classic text format 0.0.4
    PrometheusText0_0_4,
    /// Text format 1.0.0, permitting UTF-8 names
    PrometheusText1_0_0,
    /// OpenMetrics 0.0.1
    OpenMetricsText0_0_1,
    /// OpenMetrics 1.0.0
    OpenMetricsText1_0_0,
}

/// Binary first, for access to created timestamps and native histograms
pub const STATISTICS_PROTOCOLS: &[ScrapeProtocol] = &[
    ScrapeProtocol::PrometheusProto,
    ScrapeProtocol::OpenMetricsText1_0_0,
    ScrapeProtocol::PrometheusText0_0_4,
    ScrapeProtocol::OpenMetricsText0_0_1,
];

/// Human readable formats only
pub const DISPLAY_PROTOCOLS: &[ScrapeProtocol] = &[
    ScrapeProtocol::OpenMetricsText1_0_0,
    ScrapeProtocol::PrometheusText0_0_4,
    ScrapeProtocol::OpenMetricsText0_0_1,
];

impl ScrapeProtocol {
    /// Every known protocol
    pub const ALL: [ScrapeProtocol; 5] = [
        ScrapeProtocol::PrometheusProto,
        ScrapeProtocol::PrometheusText0_0_4,
        ScrapeProtocol::PrometheusText1_0_0,
        ScrapeProtocol::OpenMetricsText0_0_1,
        ScrapeProtocol::OpenMetricsText1_0_0,
    ];

    /// The media type requested for this protocol
    #[must_use]
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::PrometheusProto => {
                "application/vnd.google.protobuf;proto=io.prometheus.client.MetricFamily;encoding=delimited"
            }
            Self::PrometheusText0_0_4 => "text/plain;version=0.0.4",
            Self::PrometheusText1_0_0 => "text/plain;version=1.0.0;escaping=allow-utf-8",
            Self::OpenMetricsText0_0_1 => "application/openmetrics-text;version=0.0.1",
            Self::OpenMetricsText1_0_0 => "application/openmetrics-text;version=1.0.0",
        }
    }
}

impl fmt::Display for ScrapeProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

/// Build an `Accept` value preferring `protocols` in the given order.
///
/// Weights start at `0.<n>` where `n` is one more than the number of known
/// protocols and decrease by one per entry. A `*/*` fallback takes the next
/// weight.
#[must_use]
pub fn accept_header(protocols: &[ScrapeProtocol]) -> String {
    let mut weight = ScrapeProtocol::ALL.len() + 1;
    let mut values = Vec::with_capacity(protocols.len() + 1);
    for protocol in protocols {
        values.push(format!("{};q=0.{weight}", protocol.media_type()));
        weight = weight.saturating_sub(1);
    }
    values.push(format!("*/*;q=0.{weight}"));
    values.join(",")
}

/// Headers sent with every scrape request
///
/// # Errors
///
/// Fails only if a generated value is not a valid header value, which the
/// known media types never produce.
pub fn scrape_headers(
    protocols: &[ScrapeProtocol],
    timeout: Duration,
) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_str(&accept_header(protocols))?);
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(
        SCRAPE_TIMEOUT_HEADER.clone(),
        HeaderValue::from(timeout.as_secs()),
    );
    Ok(headers)
}
