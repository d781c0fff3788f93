//! Label sets and their fingerprints
//!
//! A [`Labels`] value is the identity of a series: its name/value pairs kept
//! sorted by name, `__name__` included. Two label sets with the same pairs
//! always produce the same [`Labels::fingerprint`], regardless of the order in
//! which the pairs were seen on the wire.

use std::{fmt, hash::Hasher};

use rustc_hash::FxHasher;

/// The reserved label carrying a series' metric name.
pub const METRIC_NAME: &str = "__name__";

/// Written between every name and value fed to the fingerprint hasher so that
/// `a="bc"` and `ab="c"` do not collide.
const SEPARATOR: u8 = 0xff;

/// A single name/value pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    /// The label name
    pub name: String,
    /// The label value
    pub value: String,
}

/// An ordered set of labels, sorted by name with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Labels {
    inner: Vec<Label>,
}

impl Labels {
    /// Create an empty label set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a label set from name/value pairs.
    ///
    /// When a name appears more than once the last value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut inner: Vec<Label> = pairs
            .into_iter()
            .map(|(name, value)| Label {
                name: name.into(),
                value: value.into(),
            })
            .collect();
        // stable, so equal names keep their wire order and the last one can
        // overwrite the earlier ones below
        inner.sort_by(|a, b| a.name.cmp(&b.name));

        let mut deduped: Vec<Label> = Vec::with_capacity(inner.len());
        for label in inner {
            match deduped.last_mut() {
                Some(prev) if prev.name == label.name => *prev = label,
                _ => deduped.push(label),
            }
        }
        Self { inner: deduped }
    }

    /// Look up the value of the label `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .binary_search_by(|label| label.name.as_str().cmp(name))
            .ok()
            .map(|idx| self.inner[idx].value.as_str())
    }

    /// The value of `__name__`, if present and non-empty
    #[must_use]
    pub fn metric_name(&self) -> Option<&str> {
        self.get(METRIC_NAME).filter(|name| !name.is_empty())
    }

    /// Return a copy of this set with `name` set to `value`
    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        match self
            .inner
            .binary_search_by(|label| label.name.as_str().cmp(name))
        {
            Ok(idx) => value.clone_into(&mut self.inner[idx].value),
            Err(idx) => self.inner.insert(
                idx,
                Label {
                    name: name.to_string(),
                    value: value.to_string(),
                },
            ),
        }
        self
    }

    /// Return a copy of this set without any of the labels in `names`
    #[must_use]
    pub fn without(&self, names: &[&str]) -> Self {
        Self {
            inner: self
                .inner
                .iter()
                .filter(|label| !names.contains(&label.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Iterate the labels in name order
    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.inner.iter()
    }

    /// Number of labels in the set, `__name__` included
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the set holds no labels at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// A deterministic 64-bit fingerprint of the full label set.
    ///
    /// The fingerprint is stable across processes, it does not depend on a
    /// random hasher seed.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for label in &self.inner {
            hasher.write(label.name.as_bytes());
            hasher.write_u8(SEPARATOR);
            hasher.write(label.value.as_bytes());
            hasher.write_u8(SEPARATOR);
        }
        hasher.finish()
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, label) in self.inner.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}=\"", label.name)?;
            for ch in label.value.chars() {
                match ch {
                    '\\' => f.write_str("\\\\")?,
                    '"' => f.write_str("\\\"")?,
                    '\n' => f.write_str("\\n")?,
                    c => write!(f, "{c}")?,
                }
            }
            f.write_str("\"")?;
        }
        f.write_str("}")
    }
}
