use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::IndicatorProvider;
use crate::error::FetchError;
use crate::models::{Config, IndicatorSeries, IndicatorSpec, YearRange};

/// Smallest page size requested; the API default of 50 is too small for long ranges
const MIN_PAGE_SIZE: usize = 1000;

/// World Bank API v2 client, scoped to one country
pub struct WorldBankClient {
    client: Client,
    base_url: Url,
    country: String,
}

impl WorldBankClient {
    /// Create a new client with the configured per-request timeout
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("gdp-indicators/0.1")
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| anyhow!("Invalid API base URL {}: {}", config.base_url, e))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL cannot carry a path: {}", config.base_url));
        }

        Ok(Self {
            client,
            base_url,
            country: config.country.clone(),
        })
    }

    /// `{base}/country/{country}/indicator/{code}?date=start:end&format=json&per_page=N`
    pub fn endpoint(&self, indicator_code: &str, years: YearRange) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["country", self.country.as_str(), "indicator", indicator_code]);
        }
        url.query_pairs_mut()
            .append_pair("date", &years.as_query())
            .append_pair("format", "json")
            .append_pair("per_page", &years.len().max(MIN_PAGE_SIZE).to_string());
        url
    }
}

#[async_trait::async_trait]
impl IndicatorProvider for WorldBankClient {
    async fn fetch_indicator(
        &self,
        spec: &IndicatorSpec,
        years: YearRange,
    ) -> Result<IndicatorSeries, FetchError> {
        info!("📡 Fetching {} ({})", spec.code, spec.short_name);

        let url = self.endpoint(&spec.code, years);
        debug!("GET {}", url);

        let transport = |source| FetchError::Transport {
            indicator: spec.code.clone(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                indicator: spec.code.clone(),
                status,
            });
        }

        let body = response.text().await.map_err(transport)?;
        let series = parse_response(spec, years, &body)?;
        debug!(
            "{}: {} records, {} with values",
            spec.short_name,
            series.values.len(),
            series.observed_count()
        );
        Ok(series)
    }
}

/// Parse a `[metadata, records|null]` envelope into a series.
///
/// A short envelope or a null record list is "no data" and yields a series
/// covering `years` with every value absent. Any other unexpected shape is a
/// parse error.
pub fn parse_response(
    spec: &IndicatorSpec,
    years: YearRange,
    body: &str,
) -> Result<IndicatorSeries, FetchError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::parse(&spec.code, format!("body is not JSON: {}", e)))?;

    let envelope = payload
        .as_array()
        .ok_or_else(|| FetchError::parse(&spec.code, "top-level value is not an array"))?;

    // Error replies come back as [{"message": [...]}]
    if let Some(message) = envelope.first().and_then(|meta| meta.get("message")) {
        return Err(FetchError::parse(
            &spec.code,
            format!("upstream error: {}", describe_message(message)),
        ));
    }

    let records = match envelope.get(1) {
        None | Some(Value::Null) => {
            warn!("⚠️ No data found for {}", spec.short_name);
            return Ok(IndicatorSeries::empty(spec, years));
        }
        Some(Value::Array(records)) => records,
        Some(_) => {
            return Err(FetchError::parse(
                &spec.code,
                "records element is neither null nor an array",
            ))
        }
    };

    let mut series = IndicatorSeries::new(spec);
    for (index, record) in records.iter().enumerate() {
        let record = record
            .as_object()
            .ok_or_else(|| FetchError::parse(&spec.code, format!("record {} is not an object", index)))?;
        let year = record_year(record).ok_or_else(|| {
            FetchError::parse(&spec.code, format!("record {} has no valid year in `date`", index))
        })?;
        let value = record.get("value").cloned().unwrap_or(Value::Null);

        if series.values.insert(year, value).is_some() {
            return Err(FetchError::parse(&spec.code, format!("year {} appears twice", year)));
        }
    }

    Ok(series)
}

fn record_year(record: &Map<String, Value>) -> Option<i32> {
    match record.get("date")? {
        Value::String(date) => date.trim().parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        _ => None,
    }
}

fn describe_message(message: &Value) -> String {
    match message {
        Value::Array(entries) => entries
            .iter()
            .map(|entry| {
                entry
                    .get("value")
                    .or_else(|| entry.get("key"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| entry.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
