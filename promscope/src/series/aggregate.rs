//! Fold exposition entries into a [`SeriesMap`]

use std::time::{SystemTime, UNIX_EPOCH};

use metrics::counter;
use promscope_exposition::{Entry, Error, MetricType, Parser, Sample};
use tracing::debug;

use super::{Series, SeriesMap, SeriesType};

/// Parse `body` according to `content_type` and group its series by family.
///
/// Series of histogram, gauge histogram and summary families are filed under
/// the family's base name, so `rpc_seconds_bucket`, `rpc_seconds_sum` and
/// `rpc_seconds_count` all count toward `rpc_seconds`. Native histograms are
/// filed under their own name. Entries that fail to parse are skipped.
///
/// # Errors
///
/// Returns an error if the content type is not an exposition format or a
/// protobuf payload is not correctly framed.
pub fn extract_series(body: &[u8], content_type: &str) -> Result<SeriesMap, Error> {
    let parser = Parser::for_content_type(body, content_type)?;
    let default_timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default();

    let mut series_map = SeriesMap::default();
    // base name and type of the family declared by the latest TYPE entry
    let mut active: Option<(String, MetricType)> = None;

    for entry in parser {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "failed to parse entry");
                counter!("entries_skipped").increment(1);
                continue;
            }
        };

        match entry {
            Entry::Type { name, metric_type } => {
                active = Some((name, metric_type));
            }
            Entry::Series(sample) => {
                let Some(metric_name) = sample.labels.metric_name() else {
                    debug!(labels = %sample.labels, "metric name not found in labels");
                    counter!("entries_skipped").increment(1);
                    continue;
                };
                let (family, metric_type) = match &active {
                    Some((base, metric_type)) if metric_type.is_multi_series() => {
                        (base.clone(), SeriesType::from(*metric_type))
                    }
                    Some((_, metric_type)) => {
                        (metric_name.to_string(), SeriesType::from(*metric_type))
                    }
                    None => (metric_name.to_string(), SeriesType::Unknown),
                };
                record(&mut series_map, &family, metric_type, sample, default_timestamp);
            }
            Entry::Histogram(sample) => {
                let Some(metric_name) = sample.labels.metric_name() else {
                    debug!(labels = %sample.labels, "histogram metric name not found in labels");
                    counter!("entries_skipped").increment(1);
                    continue;
                };
                let family = metric_name.to_string();
                record(
                    &mut series_map,
                    &family,
                    SeriesType::NativeHistogram,
                    sample,
                    default_timestamp,
                );
            }
            Entry::Help { .. } | Entry::Unit { .. } | Entry::Comment => {}
        }
    }

    Ok(series_map)
}

fn record(
    series_map: &mut SeriesMap,
    family: &str,
    metric_type: SeriesType,
    sample: Sample,
    default_timestamp: i64,
) {
    let fingerprint = sample.labels.fingerprint();
    let created_timestamp = sample.created_timestamp.unwrap_or_default();
    let series = Series {
        labels: sample.labels,
        metric_type,
        created_timestamp,
        exemplars: sample.exemplars.into_iter().map(Into::into).collect(),
        name: family.to_string(),
    };

    debug!(
        metric = %series.name,
        labels = %series.labels,
        metric_type = %metric_type,
        timestamp = sample.timestamp.unwrap_or(default_timestamp),
        has_ct_zero = created_timestamp != 0,
        exemplar_count = series.exemplars.len(),
        "found series"
    );
    counter!("series_recorded").increment(1);

    series_map.family_mut(family).insert(fingerprint, series);
}

#[allow(clippy::needless_raw_string_hashes)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::LabelStats;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use proptest::prelude::*;

    const TEXT: &str = "text/plain; version=0.0.4";
    const OPENMETRICS: &str = "application/openmetrics-text; version=1.0.0";

    #[test]
    fn counter_family_end_to_end() {
        let body = r#"# HELP http_requests_total Total requests.
# TYPE http_requests_total counter
http_requests_total{method="GET"} 10
http_requests_total{method="POST"} 3
"#;
        let series = extract_series(body.as_bytes(), TEXT).unwrap();
        assert_eq!(series.len(), 1);

        let family = series.get("http_requests_total").unwrap();
        assert_eq!(family.cardinality(), 2);
        assert_eq!(family.metric_type_string(), "counter");
        assert_eq!(
            family.label_stats(),
            vec![LabelStats {
                name: "method".to_string(),
                distinct_values: 2,
            }]
        );
    }

    #[test]
    fn label_stats_count_distinct_values_not_series() {
        let body = r#"# TYPE requests counter
requests{method="GET",code="200"} 1
requests{method="GET",code="500"} 1
requests{method="POST",code="200"} 1
"#;
        let series = extract_series(body.as_bytes(), TEXT).unwrap();
        let stats = series.get("requests").unwrap().label_stats();
        let method = stats.iter().find(|s| s.name == "method").unwrap();
        assert_eq!(method.distinct_values, 2);
    }

    #[test]
    fn histogram_and_summary_series_are_grouped() {
        let body = r#"# TYPE rpc_seconds histogram
rpc_seconds_bucket{le="0.1"} 1
rpc_seconds_bucket{le="+Inf"} 2
rpc_seconds_sum 0.3
rpc_seconds_count 2
# TYPE gc_seconds summary
gc_seconds{quantile="0.5"} 0.1
gc_seconds_sum 1
gc_seconds_count 4
# TYPE up gauge
up 1
"#;
        let series = extract_series(body.as_bytes(), TEXT).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.get("rpc_seconds_bucket").is_none());

        let histogram = series.get("rpc_seconds").unwrap();
        assert_eq!(histogram.cardinality(), 4);
        assert_eq!(histogram.metric_type_string(), "histogram");
        assert!(histogram.iter().all(|s| s.name == "rpc_seconds"));

        assert_eq!(series.get("gc_seconds").unwrap().cardinality(), 3);
        assert_eq!(series.get("up").unwrap().metric_type_string(), "gauge");
    }

    #[test]
    fn untyped_series_are_unknown() {
        let body = "orphan{a=\"1\"} 1\n";
        let series = extract_series(body.as_bytes(), TEXT).unwrap();
        assert_eq!(series.get("orphan").unwrap().metric_type_string(), "unknown");
    }

    #[test]
    fn duplicate_label_sets_are_counted_once() {
        let body = "# TYPE a gauge\na{x=\"1\"} 1\na{x=\"1\"} 2\n";
        let series = extract_series(body.as_bytes(), TEXT).unwrap();
        assert_eq!(series.total_series(), 1);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let body = "# TYPE a gauge\na{x=\"1\"} 1\na{x=} 2\na{x=\"2\"} nope\na{x=\"3\"} 3\n";
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        let series = metrics::with_local_recorder(&recorder, || {
            extract_series(body.as_bytes(), TEXT).unwrap()
        });
        assert_eq!(series.get("a").unwrap().cardinality(), 2);

        let skipped = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find(|(key, _, _, _)| key.key().name() == "entries_skipped")
            .map(|(_, _, _, value)| value);
        assert_eq!(skipped, Some(DebugValue::Counter(2)));
    }

    #[test]
    fn nameless_series_are_not_recorded() {
        let body = "{label=\"value\"} 1\nup 1\n";
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        let series = metrics::with_local_recorder(&recorder, || {
            extract_series(body.as_bytes(), TEXT).unwrap()
        });
        assert_eq!(series.len(), 1);
        assert_eq!(series.get("up").unwrap().cardinality(), 1);
        assert!(
            series
                .iter()
                .flat_map(|(_, set)| set.iter())
                .all(|s| s.labels.metric_name().is_some())
        );

        let skipped = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find(|(key, _, _, _)| key.key().name() == "entries_skipped")
            .map(|(_, _, _, value)| value);
        assert_eq!(skipped, Some(DebugValue::Counter(1)));
    }

    #[test]
    fn openmetrics_created_and_exemplars_are_attached() {
        let body = r#"# TYPE foo counter
foo_total{a="1"} 17.0 # {trace_id="abc"} 1.0 1620000000.0
foo_created{a="1"} 1620000000.5
# EOF
"#;
        let series = extract_series(body.as_bytes(), OPENMETRICS).unwrap();
        let family = series.get("foo_total").unwrap();
        let sample = family.iter().next().unwrap();
        assert_eq!(sample.created_timestamp, 1_620_000_000_500);
        assert_eq!(sample.exemplars.len(), 1);
        assert!(sample.exemplars[0].has_timestamp);
        assert_eq!(sample.exemplars[0].timestamp, 1_620_000_000_000);
        assert_eq!(family.created_timestamp(), 1_620_000_000_500);
    }

    #[test]
    fn empty_payload_is_an_empty_map() {
        let series = extract_series(b"", "").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn unsupported_content_type_fails() {
        assert!(matches!(
            extract_series(b"up 1\n", "text/html"),
            Err(Error::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn protobuf_native_histogram_is_its_own_family() {
        use prost::Message;
        use promscope_exposition::proto;

        let family = proto::MetricFamily {
            name: Some("latency".to_string()),
            r#type: Some(proto::MetricType::Histogram as i32),
            metric: vec![proto::Metric {
                histogram: Some(proto::Histogram {
                    sample_count: Some(1),
                    schema: Some(0),
                    zero_threshold: Some(0.001),
                    created_timestamp: Some(proto::Timestamp {
                        seconds: 1_620_000_000,
                        nanos: 0,
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut body = Vec::new();
        family.encode_length_delimited(&mut body).unwrap();

        let series = extract_series(
            &body,
            "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=delimited",
        )
        .unwrap();
        let latency = series.get("latency").unwrap();
        assert_eq!(latency.metric_type_string(), "native_histogram");
        assert_eq!(latency.created_timestamp(), 1_620_000_000_000);
    }

    proptest! {
        #[test]
        fn prop_cardinality_is_order_independent(
            values in prop::collection::btree_set("[a-z]{1,6}", 1..20),
        ) {
            let lines: Vec<String> = values
                .iter()
                .map(|v| format!("requests{{path=\"{v}\"}} 1"))
                .collect();
            let forward = format!("# TYPE requests counter\n{}\n", lines.join("\n"));
            let backward = format!(
                "# TYPE requests counter\n{}\n",
                lines.iter().rev().cloned().collect::<Vec<_>>().join("\n")
            );

            let forward = extract_series(forward.as_bytes(), TEXT).unwrap();
            let backward = extract_series(backward.as_bytes(), TEXT).unwrap();
            let cardinality = forward.get("requests").unwrap().cardinality();
            prop_assert_eq!(cardinality, values.len());
            prop_assert_eq!(forward, backward);
        }
    }
}
