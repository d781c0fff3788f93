#![allow(clippy::print_stdout)]

use std::{path::PathBuf, time::Duration};

use byte_unit::Byte;
use clap::{ArgGroup, Parser};
use promscope::{
    config::Config,
    scrape::{self, ScrapeResult, Scraper},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Scrape failed: {0}")]
    Scrape(#[from] scrape::Error),
    #[error("No family named {0} in the scrape")]
    UnknownFamily(String),
}

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
#[clap(group(
    ArgGroup::new("source")
        .required(true)
        .args(&["scrape_url", "scrape_file"]),
))]
struct Args {
    /// URL of the target's metrics endpoint
    #[clap(long)]
    scrape_url: Option<String>,
    /// Path to a saved scrape in the text format
    #[clap(long)]
    scrape_file: Option<PathBuf>,
    /// Timeout of each scrape request
    #[clap(long, default_value_t = 10)]
    timeout_seconds: u64,
    /// Payloads of this size or larger are refused, e.g. "10MiB"
    #[clap(long, default_value = "10MiB")]
    max_body_size: Byte,
    /// YAML file configuring authentication, TLS and proxying
    #[clap(long)]
    http_config_file: Option<PathBuf>,
    /// Print the raw text of one family instead of the table
    #[clap(long)]
    show: Option<String>,
    /// Print at most this many families
    #[clap(long)]
    limit: Option<usize>,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config {
            scrape_url: args.scrape_url.clone(),
            scrape_file: args.scrape_file.clone(),
            timeout: Duration::from_secs(args.timeout_seconds),
            max_body_size: args.max_body_size.as_u64(),
            http_config_file: args.http_config_file.clone(),
        }
    }
}

fn print_table(result: &ScrapeResult, limit: Option<usize>) {
    println!("NAME\tCARDINALITY\tTYPE\tLABELS\tCREATED");
    for row in result
        .series
        .as_rows()
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
    {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            row.name, row.cardinality, row.metric_type, row.labels, row.created
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .finish()
        .init();

    let args = Args::parse();
    let version = env!("CARGO_PKG_VERSION");
    info!("Starting promscope {version}.");

    let result = match Scraper::new(Config::from(&args)).scrape().await {
        Ok(result) => result,
        Err(err) => {
            error!("{err}");
            return Err(err.into());
        }
    };

    if let Some(family) = &args.show {
        let text = result
            .series_scrape_text
            .get(family)
            .ok_or_else(|| Error::UnknownFamily(family.clone()))?;
        print!("{text}");
        return Ok(());
    }

    print_table(&result, args.limit);
    info!(
        content_type = %result.used_content_type,
        families = result.series.len(),
        series = result.series.total_series(),
        "scrape analyzed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn exactly_one_source_is_required() {
        assert!(Args::try_parse_from(["promscope"]).is_err());
        assert!(
            Args::try_parse_from([
                "promscope",
                "--scrape-url",
                "http://localhost:9090/metrics",
                "--scrape-file",
                "metrics.prom",
            ])
            .is_err()
        );
    }

    #[test]
    fn arguments_become_config() {
        let args = Args::try_parse_from([
            "promscope",
            "--scrape-url",
            "http://localhost:9090/metrics",
            "--max-body-size",
            "1KiB",
            "--timeout-seconds",
            "3",
        ])
        .unwrap();
        let config = Config::from(&args);
        assert_eq!(config.max_body_size, 1024);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.scrape_file.is_none());

        let args =
            Args::try_parse_from(["promscope", "--scrape-file", "metrics.prom"]).unwrap();
        assert_eq!(Config::from(&args).max_body_size, 10 * 1024 * 1024);
    }
}
