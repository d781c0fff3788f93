//! Prometheus and OpenMetrics text format parser
//!
//! This module provides a parser for the Prometheus text exposition format and
//! its OpenMetrics descendant.
//! <https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md>
//! <https://github.com/OpenObservability/OpenMetrics/blob/main/specification/OpenMetrics.md>
//!
//! The two differ in a handful of places only: OpenMetrics timestamps are
//! float seconds rather than integer milliseconds, samples may carry an
//! exemplar after a `#`, families may declare a UNIT, counters and histograms
//! expose their creation time as a `_created` series, and the payload ends
//! with `# EOF`.

use rustc_hash::FxHashMap;

use crate::{Entry, Exemplar, METRIC_NAME, MetricType, ParseError, Sample, labels::Labels};

/// Labels that differ between the sub-series of one histogram or summary
/// sample but not between it and its `_created` series.
const SUB_SERIES_LABELS: [&str; 3] = [METRIC_NAME, "le", "quantile"];

/// Parser for the text exposition formats, yielding one entry per line
#[derive(Debug)]
pub struct TextParser<'a> {
    lines: Vec<&'a [u8]>,
    position: usize,
    open_metrics: bool,
    done: bool,
    /// The family named by the latest TYPE line
    family: Option<String>,
    /// Created timestamps of `family`, keyed by the fingerprint of the labels
    /// its sub-series share
    created: FxHashMap<u64, i64>,
}

impl<'a> TextParser<'a> {
    /// Create a new parser over `body`. When `open_metrics` is set the
    /// OpenMetrics dialect is parsed.
    #[must_use]
    pub fn new(body: &'a [u8], open_metrics: bool) -> Self {
        Self {
            lines: body.split(|b| *b == b'\n').collect(),
            position: 0,
            open_metrics,
            done: false,
            family: None,
            created: FxHashMap::default(),
        }
    }

    /// Parse a single line of text format, `None` if the line is blank
    pub fn parse_line(&mut self, line: &str) -> Option<Result<Entry, ParseError>> {
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if let Some(comment) = line.strip_prefix('#') {
            return Some(self.parse_comment(comment));
        }

        Some(self.parse_sample_line(line).map(Entry::Series))
    }

    fn parse_comment(&mut self, comment: &str) -> Result<Entry, ParseError> {
        // `#HELP` is an ordinary comment, keywords must be separated from the
        // hash by whitespace
        if !comment.starts_with([' ', '\t']) {
            return Ok(Entry::Comment);
        }
        let (keyword, rest) = split_token(comment);

        match keyword {
            "TYPE" => {
                let (name, rest) = split_token(rest);
                if name.is_empty() {
                    return Err(ParseError::InvalidFormat(
                        "Missing metric name in TYPE line".to_string(),
                    ));
                }
                let (metric_type_str, _) = split_token(rest);
                if metric_type_str.is_empty() {
                    return Err(ParseError::InvalidFormat(
                        "Missing metric type in TYPE line".to_string(),
                    ));
                }
                let metric_type: MetricType = metric_type_str.parse()?;
                self.enter_family(name, metric_type);

                Ok(Entry::Type {
                    name: name.to_string(),
                    metric_type,
                })
            }
            "HELP" => {
                let (name, text) = split_token(rest);
                if name.is_empty() {
                    return Err(ParseError::InvalidFormat(
                        "Missing metric name in HELP line".to_string(),
                    ));
                }
                Ok(Entry::Help {
                    name: name.to_string(),
                    text: text.to_string(),
                })
            }
            "UNIT" if self.open_metrics => {
                let (name, unit) = split_token(rest);
                if name.is_empty() {
                    return Err(ParseError::InvalidFormat(
                        "Missing metric name in UNIT line".to_string(),
                    ));
                }
                Ok(Entry::Unit {
                    name: name.to_string(),
                    unit: unit.to_string(),
                })
            }
            "EOF" if self.open_metrics => {
                self.done = true;
                Ok(Entry::Comment)
            }
            _ => Ok(Entry::Comment),
        }
    }

    /// Track the family opened by a TYPE line. For OpenMetrics families that
    /// may expose `_created` series the remainder of the family is scanned
    /// ahead, as the `_created` line follows the samples it applies to.
    fn enter_family(&mut self, name: &str, metric_type: MetricType) {
        self.created.clear();
        self.family = Some(name.to_string());

        if !self.open_metrics
            || !matches!(
                metric_type,
                MetricType::Counter | MetricType::Histogram | MetricType::Summary
            )
        {
            return;
        }

        let created_name = format!("{name}_created");
        for raw in &self.lines[self.position..] {
            let Ok(line) = std::str::from_utf8(raw) else {
                continue;
            };
            let line = line.trim();
            if line.starts_with("# TYPE") || line.starts_with("# EOF") {
                break;
            }
            if line.is_empty() || line.starts_with('#') || !line.starts_with(created_name.as_str())
            {
                continue;
            }
            let Ok(sample) = parse_sample(line, true) else {
                continue;
            };
            if sample.labels.metric_name() != Some(created_name.as_str()) {
                continue;
            }
            if let Some(created_ms) = seconds_to_millis(sample.value) {
                self.created.insert(created_key(&sample.labels), created_ms);
            }
        }
    }

    fn parse_sample_line(&self, line: &str) -> Result<Sample, ParseError> {
        let mut sample = parse_sample(line, self.open_metrics)?;

        if let (Some(family), false) = (&self.family, self.created.is_empty()) {
            let is_family_member = sample
                .labels
                .metric_name()
                .is_some_and(|name| name.starts_with(family.as_str()) && !name.ends_with("_created"));
            if is_family_member {
                sample.created_timestamp = self.created.get(&created_key(&sample.labels)).copied();
            }
        }

        Ok(sample)
    }
}

impl Iterator for TextParser<'_> {
    type Item = Result<Entry, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line_number = self.position + 1;
            let raw = *self.lines.get(self.position)?;
            self.position += 1;

            let Ok(line) = std::str::from_utf8(raw) else {
                return Some(Err(ParseError::InvalidUtf8(line_number)));
            };
            if let Some(result) = self.parse_line(line) {
                return Some(result);
            }
        }
        None
    }
}

fn created_key(labels: &Labels) -> u64 {
    labels.without(&SUB_SERIES_LABELS).fingerprint()
}

/// Split off the first whitespace delimited token, returning it and the
/// remainder with leading whitespace removed.
fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_millis(seconds: f64) -> Option<i64> {
    if !seconds.is_finite() {
        return None;
    }
    Some((seconds * 1_000.0).round() as i64)
}

/// Parse a sample line: `name{labels} value [timestamp] [# exemplar]`
fn parse_sample(line: &str, open_metrics: bool) -> Result<Sample, ParseError> {
    let mut cursor = Cursor::new(line);
    let mut name = cursor
        .take_while(|c| !c.is_whitespace() && c != '{')
        .to_string();

    let mut pairs = Vec::new();
    if cursor.peek() == Some('{') {
        let block = parse_label_block(&mut cursor)?;
        if let Some(quoted) = block.name {
            if !name.is_empty() {
                return Err(ParseError::InvalidFormat(format!(
                    "Metric name given twice: {name} and {quoted}"
                )));
            }
            name = quoted;
        }
        pairs = block.labels;
    }

    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    let rest = cursor.rest();
    let (rest, exemplar) = match rest.split_once('#') {
        Some((head, tail)) if open_metrics => (head, Some(parse_exemplar(tail)?)),
        Some(_) => {
            return Err(ParseError::InvalidFormat(
                "Value contains comment marker".to_string(),
            ));
        }
        None => (rest, None),
    };
    let (value, timestamp) = parse_value_and_timestamp(rest, open_metrics)?;

    Ok(Sample {
        labels: Labels::from_pairs(pairs).with(METRIC_NAME, &name),
        value,
        timestamp,
        created_timestamp: None,
        exemplars: exemplar.into_iter().collect(),
    })
}

fn parse_exemplar(input: &str) -> Result<Exemplar, ParseError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespace();
    if cursor.peek() != Some('{') {
        return Err(ParseError::InvalidExemplar(
            "Exemplar must start with a label block".to_string(),
        ));
    }
    let block =
        parse_label_block(&mut cursor).map_err(|e| ParseError::InvalidExemplar(e.to_string()))?;
    if block.name.is_some() {
        return Err(ParseError::InvalidExemplar(
            "Exemplar labels cannot hold a metric name".to_string(),
        ));
    }
    let (value, timestamp) = parse_value_and_timestamp(cursor.rest(), true)
        .map_err(|e| ParseError::InvalidExemplar(e.to_string()))?;

    Ok(Exemplar {
        labels: Labels::from_pairs(block.labels),
        value,
        timestamp,
    })
}

fn parse_value_and_timestamp(
    value_str: &str,
    open_metrics: bool,
) -> Result<(f64, Option<i64>), ParseError> {
    let mut parts = value_str.split_whitespace();

    let value_part = parts.next().ok_or(ParseError::MissingValue)?;
    let value = parse_float(value_part)
        .ok_or_else(|| ParseError::InvalidValue(value_part.to_string()))?;

    let timestamp = match parts.next() {
        Some(ts_str) => Some(parse_timestamp(ts_str, open_metrics)?),
        None => None,
    };

    if let Some(extra) = parts.next() {
        return Err(ParseError::InvalidFormat(format!(
            "Unexpected trailing token: {extra}"
        )));
    }

    Ok((value, timestamp))
}

fn parse_float(input: &str) -> Option<f64> {
    // Handle special float values according to Prometheus spec
    match input {
        "NaN" => Some(f64::NAN),
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => input.parse::<f64>().ok(),
    }
}

fn parse_timestamp(input: &str, open_metrics: bool) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidTimestamp(input.to_string());
    if open_metrics {
        input
            .parse::<f64>()
            .ok()
            .and_then(seconds_to_millis)
            .ok_or_else(invalid)
    } else {
        input.parse::<i64>().map_err(|_| invalid())
    }
}

#[derive(Debug, Default)]
struct LabelBlock {
    /// A quoted metric name found inside the braces
    name: Option<String>,
    labels: Vec<(String, String)>,
}

/// Parse `{name="value",...}`, leaving the cursor after the closing brace.
fn parse_label_block(cursor: &mut Cursor<'_>) -> Result<LabelBlock, ParseError> {
    let unclosed = || ParseError::InvalidLabel("Unclosed labels bracket".to_string());

    if !cursor.eat('{') {
        return Err(ParseError::InvalidLabel(
            "Label block must start with '{'".to_string(),
        ));
    }

    let mut block = LabelBlock::default();
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => return Err(unclosed()),
            Some('}') => {
                cursor.bump();
                return Ok(block);
            }
            Some('"') => {
                let quoted = parse_quoted(cursor)?;
                cursor.skip_whitespace();
                if cursor.eat('=') {
                    if quoted.is_empty() {
                        return Err(ParseError::InvalidLabel("Empty label key".to_string()));
                    }
                    cursor.skip_whitespace();
                    let value = parse_quoted(cursor)?;
                    block.labels.push((quoted, value));
                } else if block.name.is_none() {
                    block.name = Some(quoted);
                } else {
                    return Err(ParseError::InvalidLabel(
                        "More than one metric name in label block".to_string(),
                    ));
                }
            }
            Some(_) => {
                let label_name = cursor
                    .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | ',' | '}' | '"' | '{'));
                if label_name.is_empty() {
                    return Err(ParseError::InvalidLabel("Empty label key".to_string()));
                }
                cursor.skip_whitespace();
                if !cursor.eat('=') {
                    return Err(ParseError::InvalidLabel(format!(
                        "Label missing '=': {label_name}"
                    )));
                }
                cursor.skip_whitespace();
                let value = parse_quoted(cursor)?;
                block.labels.push((label_name.to_string(), value));
            }
        }

        cursor.skip_whitespace();
        match cursor.peek() {
            Some(',') => {
                cursor.bump();
            }
            Some('}') => {}
            None => return Err(unclosed()),
            Some(c) => {
                return Err(ParseError::InvalidLabel(format!(
                    "Unexpected character {c:?} in label block"
                )));
            }
        }
    }
}

/// Parse a double quoted string with `\\`, `\"` and `\n` escapes
fn parse_quoted(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    if !cursor.eat('"') {
        return Err(ParseError::InvalidLabel(
            "Label value must be quoted".to_string(),
        ));
    }

    let mut result = String::new();
    loop {
        match cursor.bump() {
            Some('\\') => match cursor.bump() {
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('n') => result.push('\n'),
                Some(c) => {
                    return Err(ParseError::InvalidLabel(format!(
                        "Invalid escape sequence: \\{c}"
                    )));
                }
                None => {
                    return Err(ParseError::InvalidLabel(
                        "Backslash at end of label value".to_string(),
                    ));
                }
            },
            Some('"') => return Ok(result),
            Some(c) => result.push(c),
            None => {
                return Err(ParseError::InvalidLabel(
                    "Label value quotes not properly paired".to_string(),
                ));
            }
        }
    }
}

#[derive(Debug)]
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

#[allow(clippy::needless_raw_string_hashes)]
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entries(text: &str, open_metrics: bool) -> Vec<Result<Entry, ParseError>> {
        TextParser::new(text.as_bytes(), open_metrics).collect()
    }

    fn samples(text: &str, open_metrics: bool) -> Vec<Sample> {
        entries(text, open_metrics)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(Entry::Series(sample)) => Some(sample),
                _ => None,
            })
            .collect()
    }

    fn sample(line: &str) -> Result<Sample, ParseError> {
        parse_sample(line, false)
    }

    #[test]
    fn test_parse_type_line() {
        let mut parser = TextParser::new(b"", false);

        let entry = parser.parse_line("# TYPE http_requests_total counter");
        assert_eq!(
            entry,
            Some(Ok(Entry::Type {
                name: "http_requests_total".to_string(),
                metric_type: MetricType::Counter,
            }))
        );

        let entry = parser.parse_line("# TYPE http_request_duration_seconds histogram");
        assert!(matches!(
            entry,
            Some(Ok(Entry::Type {
                metric_type: MetricType::Histogram,
                ..
            }))
        ));

        let entry = parser.parse_line("# TYPE broken");
        assert!(matches!(entry, Some(Err(ParseError::InvalidFormat(_)))));

        let entry = parser.parse_line("# TYPE broken bogus");
        assert!(matches!(entry, Some(Err(ParseError::UnknownMetricType(_)))));
    }

    #[test]
    fn test_help_and_comments() {
        let mut parser = TextParser::new(b"", false);
        assert_eq!(
            parser.parse_line("# HELP up Whether the target is up."),
            Some(Ok(Entry::Help {
                name: "up".to_string(),
                text: "Whether the target is up.".to_string(),
            }))
        );
        assert_eq!(parser.parse_line("# just a comment"), Some(Ok(Entry::Comment)));
        assert_eq!(parser.parse_line("#TYPE up gauge"), Some(Ok(Entry::Comment)));
        // UNIT is an OpenMetrics keyword only
        assert_eq!(parser.parse_line("# UNIT up seconds"), Some(Ok(Entry::Comment)));
        assert_eq!(parser.parse_line("   "), None);
    }

    #[test]
    fn test_parse_metric_line_no_labels() {
        let result = sample("http_requests_total 1027").unwrap();
        assert_eq!(result.labels.metric_name(), Some("http_requests_total"));
        assert_eq!(result.value, 1027.0);
        assert_eq!(result.labels.len(), 1);
        assert_eq!(result.timestamp, None);
    }

    #[test]
    fn test_parse_metric_line_with_labels() {
        let result = sample("http_requests_total{method=\"GET\",code=\"200\"} 1027").unwrap();
        assert_eq!(result.labels.metric_name(), Some("http_requests_total"));
        assert_eq!(result.value, 1027.0);
        assert_eq!(result.labels.get("method"), Some("GET"));
        assert_eq!(result.labels.get("code"), Some("200"));
        assert_eq!(result.labels.len(), 3);
    }

    #[test]
    fn test_parse_metric_line_with_timestamp() {
        let result = sample("http_requests_total 1027 1729113558073").unwrap();
        assert_eq!(result.timestamp, Some(1_729_113_558_073));

        let result = parse_sample("http_requests_total 1027 1729113558.073", true).unwrap();
        assert_eq!(result.timestamp, Some(1_729_113_558_073));

        let result = sample("http_requests_total 1027 1729113558.073");
        assert!(matches!(result, Err(ParseError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_parse_invalid_value() {
        let result = sample("http_requests_total foobar");
        assert!(matches!(result, Err(ParseError::InvalidValue(_))));

        let result = sample("http_requests_total");
        assert!(matches!(result, Err(ParseError::MissingValue)));

        let result = sample("http_requests_total 1 2 3");
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_empty_metric_name() {
        let result = sample(" {}0 ");
        assert!(matches!(result, Err(ParseError::MissingName)));

        let result = sample("{label=\"value\"} 1");
        assert!(matches!(result, Err(ParseError::MissingName)));
    }

    #[test]
    fn test_quoted_metric_name() {
        let result = sample(r#"{"http.requests", method="GET"} 3"#).unwrap();
        assert_eq!(result.labels.metric_name(), Some("http.requests"));
        assert_eq!(result.labels.get("method"), Some("GET"));

        let result = sample(r#"{"a", "b"} 3"#);
        assert!(matches!(result, Err(ParseError::InvalidLabel(_))));
    }

    #[test]
    fn test_parse_invalid_labels() {
        let result = sample("metric{=\"value\"} 123");
        assert!(matches!(result, Err(ParseError::InvalidLabel(_))));

        let result = sample("metric{key} 123");
        assert!(matches!(result, Err(ParseError::InvalidLabel(_))));

        let result = sample("metric{key=\"value\" 123");
        assert!(matches!(result, Err(ParseError::InvalidLabel(_))));

        // Empty label value and a trailing comma are allowed
        let result = sample("metric{key=\"\",} 123");
        assert!(result.is_ok());
    }

    #[test]
    fn test_label_value_escaping() {
        let result = sample(r#"metric{key="value with \"quotes\""} 123"#).unwrap();
        assert_eq!(result.labels.get("key"), Some("value with \"quotes\""));

        let result = sample(r#"metric{key="path\\to\\file"} 123"#).unwrap();
        assert_eq!(result.labels.get("key"), Some("path\\to\\file"));

        let result = sample(r#"metric{key="line1\nline2"} 123"#).unwrap();
        assert_eq!(result.labels.get("key"), Some("line1\nline2"));

        let result = sample("metric{key=unquoted} 123");
        assert!(matches!(result, Err(ParseError::InvalidLabel(_))));

        let result = sample(r#"metric{key="invalid\x"} 123"#);
        assert!(matches!(result, Err(ParseError::InvalidLabel(_))));

        let result = sample(r#"metric{key="} 123"#);
        assert!(matches!(result, Err(ParseError::InvalidLabel(_))));
    }

    #[test]
    fn test_label_values_with_delimiters() {
        let result =
            sample(r#"http_requests_total{method="post",code="2,00",content="text==true"} 24"#)
                .unwrap();
        assert_eq!(result.labels.get("code"), Some("2,00"));
        assert_eq!(result.labels.get("content"), Some("text==true"));

        let result = sample(r#"escaped_counter{label="}"} 1"#).unwrap();
        assert_eq!(result.labels.get("label"), Some("}"));
    }

    #[test]
    fn test_special_float_values() {
        assert!(sample("metric NaN").unwrap().value.is_nan());
        assert_eq!(sample("metric +Inf").unwrap().value, f64::INFINITY);
        assert_eq!(sample("metric -Inf").unwrap().value, f64::NEG_INFINITY);
        assert_eq!(sample("metric 1.23e45").unwrap().value, 1.23e45);
        assert_eq!(sample("metric -42.5").unwrap().value, -42.5);
    }

    #[test]
    fn test_comment_marker_rejected_in_classic_text() {
        let result = sample(r#"metric 1 # {trace_id="a"} 1"#);
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_openmetrics_exemplar() {
        let result = parse_sample(
            r#"foo_bucket{le="0.1"} 8 # {trace_id="KOO5S4vxi0o"} 0.067 1520879607.789"#,
            true,
        )
        .unwrap();
        assert_eq!(result.exemplars.len(), 1);
        let exemplar = &result.exemplars[0];
        assert_eq!(exemplar.labels.get("trace_id"), Some("KOO5S4vxi0o"));
        assert_eq!(exemplar.value, 0.067);
        assert_eq!(exemplar.timestamp, Some(1_520_879_607_789));

        let result = parse_sample(r#"foo_total 8 # {trace_id="a"} 1"#, true).unwrap();
        assert_eq!(result.exemplars[0].timestamp, None);

        let result = parse_sample("foo_total 8 # trace_id 1", true);
        assert!(matches!(result, Err(ParseError::InvalidExemplar(_))));
    }

    #[test]
    fn test_openmetrics_created_timestamps() {
        let text = r#"# TYPE foo counter
foo_total{a="1"} 17.0
foo_created{a="1"} 1520430000.123
foo_total{a="2"} 3.0
# TYPE bar histogram
bar_bucket{le="1.0"} 1
bar_bucket{le="+Inf"} 2
bar_count 2
bar_sum 1.5
bar_created 1520430001
# EOF
"#;
        let samples = samples(text, true);
        assert_eq!(samples.len(), 8);

        let created = |name: &str, label: Option<(&str, &str)>| {
            samples
                .iter()
                .find(|s| {
                    s.labels.metric_name() == Some(name)
                        && label.is_none_or(|(k, v)| s.labels.get(k) == Some(v))
                })
                .and_then(|s| s.created_timestamp)
        };
        assert_eq!(created("foo_total", Some(("a", "1"))), Some(1_520_430_000_123));
        assert_eq!(created("foo_total", Some(("a", "2"))), None);
        assert_eq!(created("foo_created", None), None);
        assert_eq!(created("bar_bucket", Some(("le", "+Inf"))), Some(1_520_430_001_000));
        assert_eq!(created("bar_sum", None), Some(1_520_430_001_000));
    }

    #[test]
    fn test_openmetrics_stops_at_eof() {
        let text = "# TYPE a gauge\na 1\n# EOF\nb 2\n";
        assert_eq!(samples(text, true).len(), 1);
        // classic text has no EOF marker
        assert_eq!(samples(text, false).len(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_per_line() {
        let mut body = b"a 1\n".to_vec();
        body.extend_from_slice(&[0xff, 0xfe, b' ', b'1', b'\n']);
        body.extend_from_slice(b"b 2\n");

        let entries: Vec<_> = TextParser::new(&body, false).collect();
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[1], Err(ParseError::InvalidUtf8(2))));
        assert!(entries[2].is_ok());
    }

    #[test]
    fn test_parse_full_text() {
        let text = r#"
# HELP http_requests_total The total number of HTTP requests.
# TYPE http_requests_total counter
http_requests_total{method="post",code="200"} 1027 1395066363000
http_requests_total{method="post",code="400"}    3 1395066363000

# TYPE memory_usage gauge
memory_usage 5264384
"#;

        let results = entries(text, false);
        let successful_results: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(successful_results.len(), 5);

        let samples = samples(text, false);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].value, 3.0);
        assert_eq!(samples[2].labels.metric_name(), Some("memory_usage"));
    }

    #[test]
    fn test_parse_label_with_spaces() {
        let result = sample(
            r#"vector_build_info{arch="aarch64",debug="false",host="d0cf527728fe",revision="745babd 2024-09-11 14:55:36.802851761",rust_version="1.78",version="0.41.1"} 1 1729113558073"#,
        )
        .unwrap();

        assert_eq!(result.labels.metric_name(), Some("vector_build_info"));
        assert_eq!(result.value, 1.0);
        assert_eq!(result.labels.len(), 7);
        assert_eq!(
            result.labels.get("revision"),
            Some("745babd 2024-09-11 14:55:36.802851761")
        );
    }

    proptest! {
        #[test]
        fn prop_no_panic_on_any_input(input: String, open_metrics: bool) {
            let _ = entries(&input, open_metrics);
        }

        #[test]
        fn prop_no_panic_on_any_bytes(input: Vec<u8>, open_metrics: bool) {
            let _: Vec<_> = TextParser::new(&input, open_metrics).collect();
        }

        #[test]
        fn prop_valid_metric_names_accepted(
            name in "[a-zA-Z_:][a-zA-Z0-9_:]*",
            value in prop::num::f64::NORMAL | prop::num::f64::POSITIVE | prop::num::f64::NEGATIVE,
        ) {
            let line = format!("{name} {value}");
            let parsed = sample(&line);
            prop_assert!(parsed.is_ok());
            let parsed = parsed.unwrap();
            prop_assert_eq!(parsed.labels.metric_name(), Some(name.as_str()));
            prop_assert_eq!(parsed.value, value);
        }

        #[test]
        fn prop_label_escaping_roundtrip(
            name in "[a-zA-Z_][a-zA-Z0-9_]*",
            label_name in "[a-zA-Z_][a-zA-Z0-9_]*",
            raw_value in ".*",
            metric_value in "[0-9]+",
        ) {
            let escaped = raw_value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");

            let line = format!("{name}{{{label_name}=\"{escaped}\"}} {metric_value}");
            let parsed = sample(&line);
            prop_assert!(parsed.is_ok());
            let parsed = parsed.unwrap();
            prop_assert_eq!(parsed.labels.get(&label_name), Some(raw_value.as_str()));
        }

        #[test]
        fn prop_timestamp_parsing(
            name in "[a-zA-Z_][a-zA-Z0-9_]*",
            value in prop::num::f64::NORMAL,
            timestamp in prop::num::i64::ANY,
        ) {
            let line = format!("{name} {value} {timestamp}");
            let parsed = sample(&line);
            prop_assert!(parsed.is_ok());
            prop_assert_eq!(parsed.unwrap().timestamp, Some(timestamp));
        }
    }
}
