use thiserror::Error;

/// Failures of a single indicator fetch. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or a body that could not be read
    #[error("transport error while fetching {indicator}: {source}")]
    Transport {
        indicator: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-success status
    #[error("HTTP {status} while fetching {indicator}")]
    Http {
        indicator: String,
        status: reqwest::StatusCode,
    },

    /// Response body does not have the `[metadata, records|null]` shape
    #[error("unexpected response for {indicator}: {reason}")]
    Parse { indicator: String, reason: String },
}

impl FetchError {
    pub(crate) fn parse(indicator: &str, reason: impl Into<String>) -> Self {
        FetchError::Parse {
            indicator: indicator.to_string(),
            reason: reason.into(),
        }
    }

    pub fn indicator(&self) -> &str {
        match self {
            FetchError::Transport { indicator, .. }
            | FetchError::Http { indicator, .. }
            | FetchError::Parse { indicator, .. } => indicator,
        }
    }
}

/// Rejected run configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("start year {start} is after end year {end}")]
    InvertedYearRange { start: i32, end: i32 },

    #[error("year {0} is outside 1..=9999")]
    YearOutOfBounds(i32),

    #[error("year range covers {years} years; at most {max} are allowed")]
    YearSpanTooWide { years: usize, max: usize },

    #[error("country code must not be empty")]
    EmptyCountry,

    #[error("indicator #{0} has an empty code or short name")]
    EmptyIndicator(usize),

    #[error("indicator short name {0} is configured more than once")]
    DuplicateShortName(String),

    #[error("no indicators configured")]
    NoIndicators,

    #[error("fetch concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("request timeout must be at least 1 second")]
    ZeroTimeout,
}
