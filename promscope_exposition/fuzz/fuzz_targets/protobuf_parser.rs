#![no_main]

use libfuzzer_sys::fuzz_target;
use promscope_exposition::{Entry, Format, Parser};

fuzz_target!(|data: &[u8]| {
    // A corrupt envelope is refused up front, everything past that must
    // yield entries or per-family errors without panicking
    let Ok(parser) = Parser::new(data, Format::Protobuf) else {
        return;
    };

    for entry in parser.flatten() {
        if let Entry::Series(sample) | Entry::Histogram(sample) = entry {
            assert!(sample.labels.metric_name().is_some());
        }
    }
});
