//! Delimited protobuf exposition parser
//!
//! A protobuf scrape body is a sequence of `io.prometheus.client.MetricFamily`
//! messages, each preceded by its length as a varint. The envelope is split up
//! front so that a truncated or garbled body is refused before any entry is
//! produced. Each family is then decoded lazily and expanded into the same
//! entries the text parser produces, with classic histograms and summaries
//! flattened into their `_bucket`, `_sum` and `_count` series.

use std::{collections::VecDeque, ops::Range};

use prost::Message;
use tracing::trace;

use crate::{
    Entry, Error, Exemplar, METRIC_NAME, MetricType, ParseError, Sample,
    labels::Labels,
    proto::{self, MetricFamily},
};

/// Parser for delimited `MetricFamily` payloads
#[derive(Debug)]
pub struct ProtobufParser<'a> {
    body: &'a [u8],
    frames: VecDeque<Range<usize>>,
    pending: VecDeque<Entry>,
}

impl<'a> ProtobufParser<'a> {
    /// Create a new parser over `body`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptEnvelope`] if a length prefix is not a valid
    /// varint or claims more bytes than the body holds.
    pub fn new(body: &'a [u8]) -> Result<Self, Error> {
        let frames = split_frames(body)?;
        trace!(frames = frames.len(), bytes = body.len(), "Split protobuf payload");
        Ok(Self {
            body,
            frames,
            pending: VecDeque::new(),
        })
    }
}

impl Iterator for ProtobufParser<'_> {
    type Item = Result<Entry, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Some(Ok(entry));
            }
            let frame = self.frames.pop_front()?;
            let expanded = MetricFamily::decode(&self.body[frame])
                .map_err(|e| ParseError::Decode(e.to_string()))
                .and_then(|family| expand_family(family, &mut self.pending));
            if let Err(e) = expanded {
                return Some(Err(e));
            }
        }
    }
}

fn split_frames(body: &[u8]) -> Result<VecDeque<Range<usize>>, Error> {
    let mut frames = VecDeque::new();
    let mut offset = 0;
    while offset < body.len() {
        let corrupt = || Error::CorruptEnvelope { offset };
        let mut cursor = &body[offset..];
        let remaining = cursor.len();
        let len = prost::encoding::decode_varint(&mut cursor).map_err(|_| corrupt())?;
        let start = offset + (remaining - cursor.len());
        let end = usize::try_from(len)
            .ok()
            .and_then(|len| start.checked_add(len))
            .filter(|end| *end <= body.len())
            .ok_or_else(corrupt)?;
        frames.push_back(start..end);
        offset = end;
    }
    Ok(frames)
}

/// Expand one family into its TYPE, HELP, UNIT and sample entries.
fn expand_family(family: MetricFamily, out: &mut VecDeque<Entry>) -> Result<(), ParseError> {
    let raw_type = family.r#type.unwrap_or_default();
    let metric_type = match proto::MetricType::try_from(raw_type) {
        Ok(proto::MetricType::Counter) => MetricType::Counter,
        Ok(proto::MetricType::Gauge) => MetricType::Gauge,
        Ok(proto::MetricType::Summary) => MetricType::Summary,
        Ok(proto::MetricType::Untyped) => MetricType::Unknown,
        Ok(proto::MetricType::Histogram) => MetricType::Histogram,
        Ok(proto::MetricType::GaugeHistogram) => MetricType::GaugeHistogram,
        Err(_) => {
            return Err(ParseError::UnknownMetricType(raw_type.to_string()));
        }
    };
    let name = family.name().to_string();
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    out.push_back(Entry::Type {
        name: name.clone(),
        metric_type,
    });
    out.push_back(Entry::Help {
        name: name.clone(),
        text: family.help().to_string(),
    });
    if !family.unit().is_empty() {
        out.push_back(Entry::Unit {
            name: name.clone(),
            unit: family.unit().to_string(),
        });
    }

    for metric in &family.metric {
        let labels = Labels::from_pairs(metric.label.iter().map(|l| (l.name(), l.value())));
        let series = SeriesBuilder {
            family: &name,
            labels,
            timestamp: metric.timestamp_ms.filter(|ts| *ts != 0),
        };

        match metric_type {
            MetricType::Counter => {
                let counter = metric.counter.clone().unwrap_or_default();
                out.push_back(Entry::Series(Sample {
                    created_timestamp: counter.created_timestamp.as_ref().map(timestamp_ms),
                    exemplars: counter.exemplar.iter().map(convert_exemplar).collect(),
                    ..series.sample("", None, counter.value())
                }));
            }
            MetricType::Gauge => {
                let value = metric.gauge.as_ref().map_or(0.0, proto::Gauge::value);
                out.push_back(Entry::Series(series.sample("", None, value)));
            }
            MetricType::Summary => {
                let summary = metric.summary.clone().unwrap_or_default();
                let created = summary.created_timestamp.as_ref().map(timestamp_ms);
                for quantile in &summary.quantile {
                    let label = ("quantile", format_float(quantile.quantile()));
                    out.push_back(Entry::Series(Sample {
                        created_timestamp: created,
                        ..series.sample("", Some(label), quantile.value())
                    }));
                }
                #[allow(clippy::cast_precision_loss)]
                let count = summary.sample_count() as f64;
                for (suffix, value) in [("_sum", summary.sample_sum()), ("_count", count)] {
                    out.push_back(Entry::Series(Sample {
                        created_timestamp: created,
                        ..series.sample(suffix, None, value)
                    }));
                }
            }
            MetricType::Histogram | MetricType::GaugeHistogram => {
                let histogram = metric.histogram.clone().unwrap_or_default();
                expand_histogram(&series, &histogram, out);
            }
            MetricType::Info | MetricType::StateSet | MetricType::Unknown => {
                let value = metric.untyped.as_ref().map_or(0.0, proto::Untyped::value);
                out.push_back(Entry::Series(series.sample("", None, value)));
            }
        }
    }

    Ok(())
}

fn expand_histogram(
    series: &SeriesBuilder<'_>,
    histogram: &proto::Histogram,
    out: &mut VecDeque<Entry>,
) {
    let created = histogram.created_timestamp.as_ref().map(timestamp_ms);
    #[allow(clippy::cast_precision_loss)]
    let count = if histogram.sample_count_float() > 0.0 {
        histogram.sample_count_float()
    } else {
        histogram.sample_count() as f64
    };

    if is_native(histogram) {
        out.push_back(Entry::Histogram(Sample {
            created_timestamp: created,
            exemplars: histogram.exemplars.iter().map(convert_exemplar).collect(),
            ..series.sample("", None, count)
        }));
        return;
    }

    let mut saw_inf = false;
    for bucket in &histogram.bucket {
        let upper_bound = bucket.upper_bound();
        saw_inf |= upper_bound == f64::INFINITY;
        #[allow(clippy::cast_precision_loss)]
        let value = if bucket.cumulative_count_float() > 0.0 {
            bucket.cumulative_count_float()
        } else {
            bucket.cumulative_count() as f64
        };
        out.push_back(Entry::Series(Sample {
            created_timestamp: created,
            exemplars: bucket.exemplar.iter().map(convert_exemplar).collect(),
            ..series.sample("_bucket", Some(("le", format_float(upper_bound))), value)
        }));
    }
    if !saw_inf {
        out.push_back(Entry::Series(Sample {
            created_timestamp: created,
            ..series.sample("_bucket", Some(("le", "+Inf".to_string())), count)
        }));
    }
    for (suffix, value) in [("_sum", histogram.sample_sum()), ("_count", count)] {
        out.push_back(Entry::Series(Sample {
            created_timestamp: created,
            ..series.sample(suffix, None, value)
        }));
    }
}

/// A histogram is native when it carries any native bucket or zero bucket
/// information.
fn is_native(histogram: &proto::Histogram) -> bool {
    !histogram.positive_span.is_empty()
        || !histogram.negative_span.is_empty()
        || histogram.zero_threshold() > 0.0
        || histogram.zero_count() > 0
        || histogram.zero_count_float() > 0.0
}

struct SeriesBuilder<'a> {
    family: &'a str,
    labels: Labels,
    timestamp: Option<i64>,
}

impl SeriesBuilder<'_> {
    fn sample(&self, suffix: &str, extra: Option<(&str, String)>, value: f64) -> Sample {
        let mut labels = self
            .labels
            .clone()
            .with(METRIC_NAME, &format!("{}{suffix}", self.family));
        if let Some((name, label_value)) = extra {
            labels = labels.with(name, &label_value);
        }
        Sample {
            labels,
            value,
            timestamp: self.timestamp,
            created_timestamp: None,
            exemplars: Vec::new(),
        }
    }
}

fn convert_exemplar(exemplar: &proto::Exemplar) -> Exemplar {
    Exemplar {
        labels: Labels::from_pairs(exemplar.label.iter().map(|l| (l.name(), l.value()))),
        value: exemplar.value(),
        timestamp: exemplar.timestamp.as_ref().map(timestamp_ms),
    }
}

fn timestamp_ms(ts: &proto::Timestamp) -> i64 {
    ts.seconds
        .saturating_mul(1_000)
        .saturating_add(i64::from(ts.nanos) / 1_000_000)
}

/// Format a bucket bound or quantile the way the text formats write them.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
