//! Concurrent indicator fetching module
//!
//! Fetches every configured indicator with a bounded number of requests in
//! flight. Each indicator fills its own named slot; the result is only handed
//! on once every fetch has finished, in configured order.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{error, info};

use crate::api::IndicatorProvider;
use crate::error::FetchError;
use crate::models::{IndicatorSeries, IndicatorSpec, YearRange};

/// Fetch all `indicators` with at most `concurrency` requests in flight.
///
/// The first failure aborts the whole fetch; remaining in-flight requests are
/// dropped. A concurrency of 1 fetches strictly one after another.
pub async fn fetch_indicators_concurrently<P>(
    provider: &P,
    indicators: &[IndicatorSpec],
    years: YearRange,
    concurrency: usize,
) -> Result<Vec<IndicatorSeries>, FetchError>
where
    P: IndicatorProvider + ?Sized,
{
    let concurrency = concurrency.max(1);
    info!(
        "🚀 Fetching {} indicators for {} ({} in flight)",
        indicators.len(),
        years.as_query(),
        concurrency
    );

    let mut slots: HashMap<&str, IndicatorSeries> = HashMap::with_capacity(indicators.len());
    let mut results = stream::iter(indicators)
        .map(|spec| async move { (spec, provider.fetch_indicator(spec, years).await) })
        .buffer_unordered(concurrency);

    while let Some((spec, result)) = results.next().await {
        match result {
            Ok(series) => {
                // No-data series were already reported by the provider
                if !series.no_data {
                    info!(
                        "✅ {}: {} observations",
                        spec.short_name,
                        series.observed_count()
                    );
                }
                slots.insert(spec.short_name.as_str(), series);
            }
            Err(e) => {
                error!("❌ Failed {} - {}", spec.code, e);
                return Err(e);
            }
        }
    }

    Ok(indicators
        .iter()
        .filter_map(|spec| slots.remove(spec.short_name.as_str()))
        .collect())
}
