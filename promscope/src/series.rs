//! The series model and the statistics derived from it
//!
//! A scrape is folded into a [`SeriesMap`]: one [`SeriesSet`] per metric
//! family, each holding the distinct series of that family keyed by the
//! fingerprint of their full label set. Everything a user sees about a family
//! (cardinality, types, label diversity, creation time) is computed on demand
//! from that map.

pub mod aggregate;

use std::{
    collections::{BTreeMap, btree_map},
    fmt,
};

use promscope_exposition::{Labels, METRIC_NAME, MetricType};
use rustc_hash::{FxHashMap, FxHashSet};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// The type a series was exposed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesType {
    /// Counter
    Counter,
    /// Gauge
    Gauge,
    /// Classic histogram, one series per bucket plus `_sum` and `_count`
    Histogram,
    /// OpenMetrics gauge histogram
    GaugeHistogram,
    /// Native histogram, a single series holding every bucket
    NativeHistogram,
    /// Summary
    Summary,
    /// OpenMetrics info
    Info,
    /// OpenMetrics state set
    StateSet,
    /// Untyped, or no TYPE line seen
    Unknown,
}

impl SeriesType {
    /// Name of the type as shown to users
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::GaugeHistogram => "gaugehistogram",
            Self::NativeHistogram => "native_histogram",
            Self::Summary => "summary",
            Self::Info => "info",
            Self::StateSet => "stateset",
            Self::Unknown => "unknown",
        }
    }
}

impl From<MetricType> for SeriesType {
    fn from(metric_type: MetricType) -> Self {
        match metric_type {
            MetricType::Counter => Self::Counter,
            MetricType::Gauge => Self::Gauge,
            MetricType::Histogram => Self::Histogram,
            MetricType::GaugeHistogram => Self::GaugeHistogram,
            MetricType::Summary => Self::Summary,
            MetricType::Info => Self::Info,
            MetricType::StateSet => Self::StateSet,
            MetricType::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exemplar attached to a series
#[derive(Debug, Clone, PartialEq)]
pub struct Exemplar {
    /// Exemplar labels, typically a trace id
    pub labels: Labels,
    /// Exemplar value
    pub value: f64,
    /// Milliseconds since the Unix epoch, meaningful if `has_timestamp`
    pub timestamp: i64,
    /// Whether the exemplar carried a timestamp
    pub has_timestamp: bool,
}

impl From<promscope_exposition::Exemplar> for Exemplar {
    fn from(exemplar: promscope_exposition::Exemplar) -> Self {
        Self {
            labels: exemplar.labels,
            value: exemplar.value,
            timestamp: exemplar.timestamp.unwrap_or_default(),
            has_timestamp: exemplar.timestamp.is_some(),
        }
    }
}

impl fmt::Display for Exemplar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.labels, self.value)?;
        if self.has_timestamp {
            match format_millis(self.timestamp) {
                Some(ts) => write!(f, " @ {ts}")?,
                None => write!(f, " @ {}ms", self.timestamp)?,
            }
        }
        Ok(())
    }
}

/// One series of a metric family
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Family name, after histogram and summary grouping
    pub name: String,
    /// The full label set, `__name__` included
    pub labels: Labels,
    /// Type the series was exposed with
    pub metric_type: SeriesType,
    /// Milliseconds since the Unix epoch at which the series was created, 0
    /// if unknown
    pub created_timestamp: i64,
    /// Exemplars in payload order
    pub exemplars: Vec<Exemplar>,
}

/// Distinct values observed for one label name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStats {
    /// Label name
    pub name: String,
    /// Number of distinct values across the set
    pub distinct_values: usize,
}

impl fmt::Display for LabelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.distinct_values)
    }
}

/// The distinct series of one metric family, keyed by label set fingerprint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    inner: BTreeMap<u64, Series>,
}

impl SeriesSet {
    /// Record `series` under `fingerprint`, replacing any series already
    /// there.
    pub fn insert(&mut self, fingerprint: u64, series: Series) {
        self.inner.insert(fingerprint, series);
    }

    /// Look up a series by the fingerprint of its label set
    #[must_use]
    pub fn get(&self, fingerprint: u64) -> Option<&Series> {
        self.inner.get(&fingerprint)
    }

    /// Iterate series in fingerprint order
    pub fn iter(&self) -> btree_map::Values<'_, u64, Series> {
        self.inner.values()
    }

    /// Whether the set holds no series
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of distinct series in the family
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.inner.len()
    }

    /// The distinct types of the family joined by `|`, in first-seen order
    #[must_use]
    pub fn metric_type_string(&self) -> String {
        let mut types: Vec<&'static str> = Vec::new();
        for series in self.iter() {
            let name = series.metric_type.as_str();
            if !types.contains(&name) {
                types.push(name);
            }
        }
        types.join("|")
    }

    /// Creation time of the family in milliseconds since the Unix epoch.
    ///
    /// Series of one family may disagree. The representative is the series
    /// with the lowest fingerprint that carries a creation time, 0 if none do.
    #[must_use]
    pub fn created_timestamp(&self) -> i64 {
        self.iter()
            .map(|series| series.created_timestamp)
            .find(|ts| *ts != 0)
            .unwrap_or_default()
    }

    /// Sorted distinct label names across the family, `__name__` excluded
    #[must_use]
    pub fn label_names(&self) -> Vec<String> {
        self.distinct_values().into_keys().map(str::to_string).collect()
    }

    /// Distinct value counts per label name, most diverse label first. Ties
    /// are ordered by name.
    #[must_use]
    pub fn label_stats(&self) -> Vec<LabelStats> {
        let mut stats: Vec<LabelStats> = self
            .distinct_values()
            .into_iter()
            .map(|(name, values)| LabelStats {
                name: name.to_string(),
                distinct_values: values.len(),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.distinct_values
                .cmp(&a.distinct_values)
                .then_with(|| a.name.cmp(&b.name))
        });
        stats
    }

    fn distinct_values(&self) -> BTreeMap<&str, FxHashSet<&str>> {
        let mut values: BTreeMap<&str, FxHashSet<&str>> = BTreeMap::new();
        for label in self.iter().flat_map(|series| series.labels.iter()) {
            if label.name == METRIC_NAME {
                continue;
            }
            values
                .entry(label.name.as_str())
                .or_default()
                .insert(label.value.as_str());
        }
        values
    }
}

impl<'a> IntoIterator for &'a SeriesSet {
    type Item = &'a Series;
    type IntoIter = btree_map::Values<'a, u64, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(u64, Series)> for SeriesSet {
    fn from_iter<I: IntoIterator<Item = (u64, Series)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// A display row summarizing one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesInfo {
    /// Family name
    pub name: String,
    /// Number of distinct series
    pub cardinality: usize,
    /// Distinct types, `|` separated
    pub metric_type: String,
    /// Label statistics, formatted as `method(2)|code(1)`
    pub labels: String,
    /// Creation time as RFC 3339, `N/A` if unknown
    pub created: String,
}

/// All families of a scrape, keyed by family name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesMap {
    inner: FxHashMap<String, SeriesSet>,
}

impl SeriesMap {
    /// The set of `family`, created empty if absent
    pub fn family_mut(&mut self, family: &str) -> &mut SeriesSet {
        self.inner.entry(family.to_string()).or_default()
    }

    /// The set of `family`, if any series were recorded for it
    #[must_use]
    pub fn get(&self, family: &str) -> Option<&SeriesSet> {
        self.inner.get(family)
    }

    /// Iterate families in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesSet)> {
        self.inner.iter().map(|(name, set)| (name.as_str(), set))
    }

    /// Number of families
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no family was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Total number of series across all families
    #[must_use]
    pub fn total_series(&self) -> usize {
        self.inner.values().map(SeriesSet::cardinality).sum()
    }

    /// One row per family, highest cardinality first. Ties are ordered by
    /// family name.
    #[must_use]
    pub fn as_rows(&self) -> Vec<SeriesInfo> {
        let mut rows: Vec<SeriesInfo> = self
            .inner
            .iter()
            .map(|(name, set)| SeriesInfo {
                name: name.clone(),
                cardinality: set.cardinality(),
                metric_type: set.metric_type_string(),
                labels: set
                    .label_stats()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("|"),
                created: match set.created_timestamp() {
                    0 => "N/A".to_string(),
                    ts => format_millis(ts).unwrap_or_else(|| ts.to_string()),
                },
            })
            .collect();
        rows.sort_by(|a, b| {
            b.cardinality
                .cmp(&a.cardinality)
                .then_with(|| a.name.cmp(&b.name))
        });
        rows
    }
}

impl FromIterator<(String, SeriesSet)> for SeriesMap {
    fn from_iter<I: IntoIterator<Item = (String, SeriesSet)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Format milliseconds since the Unix epoch as RFC 3339 in UTC
fn format_millis(millis: i64) -> Option<String> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()?
        .format(&Rfc3339)
        .ok()
}
