//! Cardinality analysis of Prometheus scrape targets.
//!
//! This library supports the promscope binary found elsewhere in this
//! project. A [`scrape::Scraper`] fetches one payload, groups its series by
//! metric family and reports how many distinct series each family exposes,
//! which labels drive that count and the raw text the target wrote.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod scrape;
pub mod series;
