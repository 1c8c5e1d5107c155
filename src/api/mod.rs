use crate::error::FetchError;
use crate::models::{IndicatorSeries, IndicatorSpec, YearRange};

pub mod world_bank_client;
pub use world_bank_client::WorldBankClient;

/// Source of per-year indicator observations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IndicatorProvider: Send + Sync {
    /// Fetch one indicator for the configured country over `years`.
    /// Each call issues a fresh request; nothing is cached.
    async fn fetch_indicator(
        &self,
        spec: &IndicatorSpec,
        years: YearRange,
    ) -> Result<IndicatorSeries, FetchError>;
}
