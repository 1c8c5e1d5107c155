use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::{IndicatorProvider, WorldBankClient};
use crate::cleaning;
use crate::concurrent_fetcher::fetch_indicators_concurrently;
use crate::models::{CleanedTable, ColumnKind, Config};
use crate::output;

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub rows: usize,
    pub imputed_rows: usize,
    pub empty_columns: Vec<String>,
    pub table: CleanedTable,
}

/// Fetch, clean and persist the indicator dataset for one configuration
pub struct DataCollector<P> {
    provider: P,
    config: Config,
}

impl DataCollector<WorldBankClient> {
    /// Collector backed by the World Bank API
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let client = WorldBankClient::new(&config)?;
        Ok(Self::new(client, config))
    }
}

impl<P: IndicatorProvider> DataCollector<P> {
    pub fn new(provider: P, config: Config) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch every indicator and build the cleaned table. Nothing is written.
    pub async fn build_table(&self) -> Result<CleanedTable> {
        let config = &self.config;
        config.validate()?;
        warn_if_future(config);

        let series = fetch_indicators_concurrently(
            &self.provider,
            &config.indicators,
            config.years,
            config.fetch_concurrency,
        )
        .await
        .context("Indicator fetch failed")?;

        let merged = cleaning::merge(config.years, &series);
        Ok(cleaning::clean(&merged, &config.derived, config.track_imputed))
    }

    /// Build the table and write it to the configured output path.
    /// A failed fetch aborts before any file is touched.
    pub async fn run(&self) -> Result<RunSummary> {
        let table = self.build_table().await?;
        log_column_summary(&table);

        let path = &self.config.output_path;
        output::write_csv(&table, path)?;
        info!("✅ Saved cleaned CSV to {}", path.display());

        Ok(RunSummary {
            output_path: path.clone(),
            rows: table.row_count(),
            imputed_rows: table
                .imputed_flags
                .as_ref()
                .map(|flags| flags.iter().filter(|f| **f).count())
                .unwrap_or(0),
            empty_columns: table
                .columns
                .iter()
                .filter(|c| c.kind == ColumnKind::Indicator && c.absent_count() == table.row_count())
                .map(|c| c.name.clone())
                .collect(),
            table,
        })
    }
}

fn log_column_summary(table: &CleanedTable) {
    for column in table.columns.iter().filter(|c| c.kind == ColumnKind::Indicator) {
        info!(
            "📊 {}: {} observed, {} imputed, {} empty",
            column.name,
            column.observed_count(),
            column.imputed_count(),
            column.absent_count()
        );
    }
}

fn warn_if_future(config: &Config) {
    let current_year = Utc::now().year();
    if config.years.end > current_year {
        warn!(
            "⚠️ End year {} is after {}; later years will be imputed or empty",
            config.years.end, current_year
        );
    }
}
