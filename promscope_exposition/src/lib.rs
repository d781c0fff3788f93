//! Parsers for the Prometheus exposition formats
//!
//! This crate decodes a scrape payload -- classic Prometheus text, OpenMetrics
//! text or the delimited protobuf format -- into a stream of typed [`Entry`]
//! values. The format is chosen once from the response content type, see
//! [`Format::from_content_type`], and a [`Parser`] then yields entries until
//! the payload is exhausted.
//!
//! Failures come in two flavors. An [`Error`] means the payload cannot be
//! parsed at all. A [`ParseError`] is yielded in place of a single entry and
//! the caller is free to skip it and carry on with the rest of the payload.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::perf)]
#![deny(clippy::suspicious)]
#![deny(clippy::complexity)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

use std::{fmt, str::FromStr};

pub mod labels;
pub mod proto;
pub mod protobuf;
pub mod text;

pub use labels::{Label, Labels, METRIC_NAME};

/// Errors that prevent a payload from being parsed at all
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The content type does not name an exposition format we understand
    #[error("Unsupported content type: {0:?}")]
    UnsupportedContentType(String),
    /// A protobuf length prefix is unreadable or runs past the payload
    #[error("Corrupt protobuf envelope at byte offset {offset}")]
    CorruptEnvelope {
        /// Offset of the offending length prefix
        offset: usize,
    },
}

/// Errors affecting a single entry of an otherwise parseable payload
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Unknown metric type in TYPE line
    #[error("Unknown metric type: {0}")]
    UnknownMetricType(String),
    /// Invalid format in the line
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Invalid value that cannot be parsed as a number
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// Invalid timestamp that cannot be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Missing value in metric line
    #[error("Missing value")]
    MissingValue,
    /// Missing name in metric line
    #[error("Missing metric name")]
    MissingName,
    /// Invalid label format
    #[error("Invalid label: {0}")]
    InvalidLabel(String),
    /// Invalid exemplar format
    #[error("Invalid exemplar: {0}")]
    InvalidExemplar(String),
    /// Line is not valid UTF-8
    #[error("Line {0} is not valid UTF-8")]
    InvalidUtf8(usize),
    /// A protobuf metric family could not be decoded
    #[error("Failed to decode metric family: {0}")]
    Decode(String),
}

/// Metric types as declared by the exposition payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// A cumulative, monotonically increasing value
    Counter,
    /// A value that can arbitrarily go up and down
    Gauge,
    /// Observations counted in configurable buckets
    Histogram,
    /// A histogram whose buckets may go down, OpenMetrics only
    GaugeHistogram,
    /// Observations summarized as quantiles
    Summary,
    /// Static information about the target, OpenMetrics only
    Info,
    /// A set of boolean states, OpenMetrics only
    StateSet,
    /// Untyped, or typed as unknown
    Unknown,
}

impl MetricType {
    /// The name of this type as written in a TYPE line
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::GaugeHistogram => "gaugehistogram",
            Self::Summary => "summary",
            Self::Info => "info",
            Self::StateSet => "stateset",
            Self::Unknown => "unknown",
        }
    }

    /// Whether samples of this type are spread over several suffixed series
    /// that belong to one family, e.g. `_bucket`, `_sum` and `_count`.
    ///
    /// Besides histogram and summary this includes the OpenMetrics gauge
    /// histogram, whose `_bucket`, `_gsum` and `_gcount` series are grouped
    /// under the base name as well. Prometheus' own tooling only groups
    /// histogram and summary families.
    #[must_use]
    pub fn is_multi_series(&self) -> bool {
        matches!(self, Self::Histogram | Self::GaugeHistogram | Self::Summary)
    }
}

impl FromStr for MetricType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "gauge" => Ok(Self::Gauge),
            "histogram" => Ok(Self::Histogram),
            "gaugehistogram" => Ok(Self::GaugeHistogram),
            "summary" => Ok(Self::Summary),
            "info" => Ok(Self::Info),
            "stateset" => Ok(Self::StateSet),
            "untyped" | "unknown" => Ok(Self::Unknown),
            _ => Err(ParseError::UnknownMetricType(s.to_string())),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exemplar attached to a sample
#[derive(Debug, Clone, PartialEq)]
pub struct Exemplar {
    /// Exemplar labels, typically a trace or span id
    pub labels: Labels,
    /// The exemplar value
    pub value: f64,
    /// Milliseconds since the Unix epoch, if the exemplar carried a timestamp
    pub timestamp: Option<i64>,
}

/// A single sample and everything the payload says about it
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Labels of the sample, `__name__` included
    pub labels: Labels,
    /// The sample value. Native histograms carry their sample count here.
    pub value: f64,
    /// Milliseconds since the Unix epoch, if the sample carried a timestamp
    pub timestamp: Option<i64>,
    /// Milliseconds since the Unix epoch at which the series was created
    pub created_timestamp: Option<i64>,
    /// Exemplars attached to the sample, in payload order
    pub exemplars: Vec<Exemplar>,
}

/// A typed entry of an exposition payload
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A TYPE declaration, binding `name` to `metric_type` until the next one
    Type {
        /// Family name
        name: String,
        /// Declared type
        metric_type: MetricType,
    },
    /// HELP metadata
    Help {
        /// Family name
        name: String,
        /// Help text, unescaped as found
        text: String,
    },
    /// UNIT metadata
    Unit {
        /// Family name
        name: String,
        /// Unit of the family
        unit: String,
    },
    /// Any other comment
    Comment,
    /// A float sample
    Series(Sample),
    /// A native histogram sample
    Histogram(Sample),
}

/// The exposition formats this crate can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Delimited `io.prometheus.client.MetricFamily` protobuf messages
    Protobuf,
    /// OpenMetrics text
    OpenMetrics,
    /// The classic Prometheus text format
    PrometheusText,
}

impl Format {
    /// Decide the payload format from an HTTP `Content-Type` value.
    ///
    /// An empty content type is treated as classic Prometheus text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedContentType`] when the media type is not an
    /// exposition format, or names a protobuf message other than
    /// `MetricFamily` in anything other than the delimited encoding.
    pub fn from_content_type(content_type: &str) -> Result<Self, Error> {
        let mut parts = content_type.split(';').map(str::trim);
        let media_type = parts.next().unwrap_or_default().to_ascii_lowercase();
        let params: Vec<(String, &str)> = parts
            .filter_map(|param| param.split_once('='))
            .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().trim_matches('"')))
            .collect();
        let param = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| *value)
        };

        match media_type.as_str() {
            "" | "text/plain" => Ok(Self::PrometheusText),
            "application/openmetrics-text" => Ok(Self::OpenMetrics),
            "application/vnd.google.protobuf"
                if param("proto") == Some("io.prometheus.client.MetricFamily")
                    && param("encoding").is_none_or(|encoding| encoding == "delimited") =>
            {
                Ok(Self::Protobuf)
            }
            _ => Err(Error::UnsupportedContentType(content_type.to_string())),
        }
    }

    /// A short human readable name of the format
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protobuf => "protobuf",
            Self::OpenMetrics => "openmetrics",
            Self::PrometheusText => "text",
        }
    }
}

/// A parser over one payload, dispatched once on its [`Format`]
#[derive(Debug)]
pub enum Parser<'a> {
    /// Classic or OpenMetrics text
    Text(text::TextParser<'a>),
    /// Delimited protobuf
    Protobuf(protobuf::ProtobufParser<'a>),
}

impl<'a> Parser<'a> {
    /// Create a parser for `body` in the given `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptEnvelope`] if `format` is protobuf and the
    /// length prefixes of `body` do not frame it exactly.
    pub fn new(body: &'a [u8], format: Format) -> Result<Self, Error> {
        match format {
            Format::PrometheusText => Ok(Self::Text(text::TextParser::new(body, false))),
            Format::OpenMetrics => Ok(Self::Text(text::TextParser::new(body, true))),
            Format::Protobuf => Ok(Self::Protobuf(protobuf::ProtobufParser::new(body)?)),
        }
    }

    /// Create a parser for `body` from its HTTP `Content-Type`.
    ///
    /// # Errors
    ///
    /// See [`Format::from_content_type`] and [`Parser::new`].
    pub fn for_content_type(body: &'a [u8], content_type: &str) -> Result<Self, Error> {
        Self::new(body, Format::from_content_type(content_type)?)
    }
}

impl Iterator for Parser<'_> {
    type Item = Result<Entry, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Parser::Text(inner) => inner.next(),
            Parser::Protobuf(inner) => inner.next(),
        }
    }
}
