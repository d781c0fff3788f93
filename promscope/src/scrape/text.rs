//! Regroup the raw lines of a text payload by metric family
//!
//! Classic histogram and summary families interleave their `_bucket`, `_sum`
//! and `_count` lines with metadata, so lines are collected per family rather
//! than as contiguous ranges.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Raw text of each family, keyed by family name. Each line is kept verbatim
/// and newline terminated.
pub type SeriesScrapeText = FxHashMap<String, String>;

/// Group the lines of a text exposition payload by family.
#[must_use]
pub fn extract_series_text(body: &[u8]) -> SeriesScrapeText {
    let text = String::from_utf8_lossy(body);

    let mut bases: FxHashSet<&str> = FxHashSet::default();
    for line in text.split('\n') {
        if !line.starts_with("# TYPE") {
            continue;
        }
        let mut parts = line.split_whitespace().skip(2);
        if let (Some(name), Some("histogram" | "gaugehistogram" | "summary")) =
            (parts.next(), parts.next())
        {
            bases.insert(name);
        }
    }

    let mut series_text = SeriesScrapeText::default();
    for line in text.split('\n') {
        if line.is_empty() {
            continue;
        }

        let parsed = if line.starts_with('#') {
            line.split_whitespace().nth(2)
        } else {
            line.split(|c: char| c == '{' || c.is_whitespace())
                .next()
                .filter(|name| !name.is_empty())
        };
        let Some(parsed) = parsed else {
            debug!(line, "failed to parse metric name from line");
            continue;
        };

        let family = if bases.contains(parsed) {
            parsed
        } else {
            bases
                .iter()
                .filter(|base| {
                    parsed
                        .strip_prefix(**base)
                        .is_some_and(|rest| rest.starts_with('_'))
                })
                .max_by_key(|base| base.len())
                .copied()
                .unwrap_or(parsed)
        };

        let block = series_text.entry(family.to_string()).or_default();
        block.push_str(line);
        block.push('\n');
    }

    series_text
}
