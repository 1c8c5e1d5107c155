use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
pub const DEFAULT_COUNTRY: &str = "IN";
pub const DEFAULT_START_YEAR: i32 = 2014;
pub const DEFAULT_END_YEAR: i32 = 2024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Accepted calendar years
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Longest scaffold a single run may build
pub const MAX_YEAR_SPAN: usize = 500;

/// Name of the per-row imputation flag column
pub const IMPUTED_FLAG_COLUMN: &str = "notes_missing_imputed";

/// Inclusive year range; also the scaffold every output table is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedYearRange { start, end });
        }
        for year in [start, end] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(ConfigError::YearOutOfBounds(year));
            }
        }
        let range = Self { start, end };
        if range.len() > MAX_YEAR_SPAN {
            return Err(ConfigError::YearSpanTooWide {
                years: range.len(),
                max: MAX_YEAR_SPAN,
            });
        }
        Ok(range)
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        (i64::from(self.end) - i64::from(self.start) + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years().contains(&year)
    }

    /// `start:end`, the form the API expects in its `date` parameter
    pub fn as_query(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

/// One upstream indicator and the column name it is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub code: String,
    pub short_name: String,
}

impl IndicatorSpec {
    pub fn new(code: &str, short_name: &str) -> Self {
        Self {
            code: code.to_string(),
            short_name: short_name.to_string(),
        }
    }
}

/// World Bank codes for the GDP dataset
pub fn default_indicators() -> Vec<IndicatorSpec> {
    vec![
        IndicatorSpec::new("NY.GDP.MKTP.CD", "GDP_current_USD"),
        IndicatorSpec::new("NY.GDP.MKTP.KD", "GDP_constant_2015_USD"),
        IndicatorSpec::new("NY.GDP.MKTP.KD.ZG", "GDP_growth_pct"),
        IndicatorSpec::new("NY.GDP.PCAP.CD", "GDP_per_capita_current_USD"),
        IndicatorSpec::new("SP.POP.TOTL", "Population_total"),
    ]
}

/// A column computed as `source / divisor` after interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    pub name: String,
    pub source: String,
    pub divisor: f64,
}

impl DerivedColumn {
    pub fn billions(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            divisor: 1e9,
        }
    }
}

pub fn default_derived_columns() -> Vec<DerivedColumn> {
    vec![
        DerivedColumn::billions("GDP_current_billion_USD", "GDP_current_USD"),
        DerivedColumn::billions("GDP_constant_2015_billion_USD", "GDP_constant_2015_USD"),
    ]
}

/// Configuration for a single pipeline run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub country: String,
    pub years: YearRange,
    pub indicators: Vec<IndicatorSpec>,
    pub derived: Vec<DerivedColumn>,
    pub timeout_secs: u64,
    pub fetch_concurrency: usize,
    pub track_imputed: bool,
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let years = YearRange {
            start: DEFAULT_START_YEAR,
            end: DEFAULT_END_YEAR,
        };
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            years,
            indicators: default_indicators(),
            derived: default_derived_columns(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fetch_concurrency: 1,
            track_imputed: true,
            output_path: default_output_path(DEFAULT_COUNTRY, years),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is validated here so command-line overrides can still replace
    /// bad values; call [`Config::validate`] once every source is merged.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let years = YearRange {
            start: env_or("WB_START_YEAR", DEFAULT_START_YEAR),
            end: env_or("WB_END_YEAR", DEFAULT_END_YEAR),
        };
        let country = std::env::var("WB_COUNTRY").unwrap_or_else(|_| DEFAULT_COUNTRY.to_string());

        Config {
            base_url: std::env::var("WB_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            output_path: std::env::var("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_output_path(&country, years)),
            country,
            years,
            indicators: default_indicators(),
            derived: default_derived_columns(),
            timeout_secs: env_or("WB_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            fetch_concurrency: env_or("WB_FETCH_CONCURRENCY", 1),
            track_imputed: std::env::var("TRACK_IMPUTED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        YearRange::new(self.years.start, self.years.end)?;

        if self.country.trim().is_empty() {
            return Err(ConfigError::EmptyCountry);
        }
        if self.indicators.is_empty() {
            return Err(ConfigError::NoIndicators);
        }

        let mut seen = HashSet::new();
        for (index, spec) in self.indicators.iter().enumerate() {
            if spec.code.trim().is_empty() || spec.short_name.trim().is_empty() {
                return Err(ConfigError::EmptyIndicator(index));
            }
            if !seen.insert(spec.short_name.as_str()) {
                return Err(ConfigError::DuplicateShortName(spec.short_name.clone()));
            }
        }

        if self.fetch_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// `india_gdp_<start>_<end>.csv` for India, `<code>_gdp_<start>_<end>.csv` otherwise
pub fn default_output_path(country: &str, years: YearRange) -> PathBuf {
    let slug = match country.to_ascii_uppercase().as_str() {
        "IN" | "IND" => "india".to_string(),
        other => other.to_ascii_lowercase(),
    };
    PathBuf::from(format!("{}_gdp_{}_{}.csv", slug, years.start, years.end))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Raw per-year values of one indicator, as returned upstream.
/// `Value::Null` marks an absent observation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub code: String,
    pub short_name: String,
    pub values: BTreeMap<i32, Value>,
    /// Set when the upstream envelope carried no records at all
    pub no_data: bool,
}

impl IndicatorSeries {
    pub fn new(spec: &IndicatorSpec) -> Self {
        Self {
            code: spec.code.clone(),
            short_name: spec.short_name.clone(),
            values: BTreeMap::new(),
            no_data: false,
        }
    }

    /// Series covering every year of `years` with every value absent
    pub fn empty(spec: &IndicatorSpec, years: YearRange) -> Self {
        Self {
            values: years.years().map(|y| (y, Value::Null)).collect(),
            no_data: true,
            ..Self::new(spec)
        }
    }

    pub fn observed_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_null()).count()
    }
}

/// One column of the merged table, still holding raw upstream values
#[derive(Debug, Clone, PartialEq)]
pub struct MergedColumn {
    pub name: String,
    pub cells: Vec<Value>,
}

/// Scaffold years with every indicator left-joined on
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub years: Vec<i32>,
    pub columns: Vec<MergedColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Indicator,
    Derived,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Option<f64>>,
    /// Cells filled by interpolation or boundary fill
    pub imputed: Vec<bool>,
}

impl NumericColumn {
    pub fn observed_count(&self) -> usize {
        self.values
            .iter()
            .zip(&self.imputed)
            .filter(|(v, imputed)| v.is_some() && !**imputed)
            .count()
    }

    pub fn imputed_count(&self) -> usize {
        self.imputed.iter().filter(|i| **i).count()
    }

    pub fn absent_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Final numeric table, one row per scaffold year
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub years: Vec<i32>,
    pub columns: Vec<NumericColumn>,
    /// Present when imputation tracking is on
    pub imputed_flags: Option<Vec<bool>>,
}

impl CleanedTable {
    pub fn row_count(&self) -> usize {
        self.years.len()
    }

    pub fn column(&self, name: &str) -> Option<&NumericColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Header row in output order
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.columns.len() + 2);
        headers.push("year".to_string());
        headers.extend(self.columns.iter().map(|c| c.name.clone()));
        if self.imputed_flags.is_some() {
            headers.push(IMPUTED_FLAG_COLUMN.to_string());
        }
        headers
    }
}
