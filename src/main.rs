use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gdp_indicators::data_collector::DataCollector;
use gdp_indicators::models::{default_output_path, Config, YearRange};
use gdp_indicators::output;

/// Fetch World Bank GDP indicators, fill gaps, and write a CSV for the charts
#[derive(Parser, Debug)]
#[command(name = "gdp-indicators")]
#[command(version, about, long_about = None)]
struct Args {
    /// ISO country code (defaults to WB_COUNTRY or IN)
    #[arg(long, short = 'c')]
    country: Option<String>,

    /// First year of the table (inclusive)
    #[arg(long, short = 's')]
    start_year: Option<i32>,

    /// Last year of the table (inclusive)
    #[arg(long, short = 'e')]
    end_year: Option<i32>,

    /// Output CSV path (defaults to <country>_gdp_<start>_<end>.csv)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Do not write the notes_missing_imputed column
    #[arg(long)]
    no_track_imputed: bool,

    /// Indicators fetched at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Rows of the finished table to log
    #[arg(long, default_value_t = 12)]
    preview_rows: usize,
}

impl Args {
    /// Command-line values take precedence over the environment. The merged
    /// configuration is validated once, after every override is in place.
    fn apply(self, mut config: Config) -> Result<Config> {
        // A path that differs from the derived default was chosen explicitly
        let custom_output = self.output.is_some()
            || config.output_path != default_output_path(&config.country, config.years);

        if let Some(country) = self.country {
            config.country = country;
        }
        config.years = YearRange {
            start: self.start_year.unwrap_or(config.years.start),
            end: self.end_year.unwrap_or(config.years.end),
        };
        config.output_path = match self.output {
            Some(path) => path,
            None if custom_output => config.output_path,
            None => default_output_path(&config.country, config.years),
        };
        if self.no_track_imputed {
            config.track_imputed = false;
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch_concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gdp_indicators=info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let args = Args::parse();
    let preview_rows = args.preview_rows;

    let config = match args.apply(Config::from_env()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "🌏 {} indicators for {} over {}",
        config.indicators.len(),
        config.country,
        config.years.as_query()
    );

    let collector = DataCollector::from_config(config)?;
    let summary = match collector.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    if !summary.empty_columns.is_empty() {
        eprintln!("⚠️  No data available for: {}", summary.empty_columns.join(", "));
    }
    output::preview(&summary.table, preview_rows);
    Ok(())
}
