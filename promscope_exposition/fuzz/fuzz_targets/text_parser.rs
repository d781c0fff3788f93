#![no_main]

use libfuzzer_sys::fuzz_target;
use promscope_exposition::{Entry, Format, METRIC_NAME, ParseError, Parser};

fuzz_target!(|data: &[u8]| {
    fuzz_text_parser(data, Format::PrometheusText);
    fuzz_text_parser(data, Format::OpenMetrics);
});

fn fuzz_text_parser(data: &[u8], format: Format) {
    let Ok(parser) = Parser::new(data, format) else {
        panic!("text formats never fail up front");
    };

    for result in parser {
        match result {
            Ok(Entry::Series(sample)) => {
                // Empty metric names should have been rejected by parser
                let name = sample.labels.metric_name();
                assert!(name.is_some(), "Parser should reject empty metric names");

                for label in &sample.labels {
                    if label.name != METRIC_NAME {
                        assert!(!label.name.is_empty(), "Label key should not be empty");
                    }
                }
            }
            Ok(Entry::Type { name, .. }) => {
                assert!(!name.is_empty(), "TYPE lines must name a family");
            }
            Ok(_) => {}
            Err(ParseError::InvalidUtf8(line)) => {
                assert!(line > 0, "Line numbers are one based");
            }
            Err(_) => {}
        }
    }
}
