//! Common test utilities and helpers

/// Canned World Bank responses and configurations
pub mod fixtures {
    use gdp_indicators::models::{Config, YearRange};
    use serde_json::{json, Value};
    use std::path::Path;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A one-page `[metadata, records]` body in the shape the API returns
    pub fn records_body(code: &str, records: &[(i32, Value)]) -> Value {
        let records: Vec<Value> = records
            .iter()
            .rev()
            .map(|(year, value)| {
                json!({
                    "indicator": {"id": code, "value": code},
                    "country": {"id": "IN", "value": "India"},
                    "countryiso3code": "IND",
                    "date": year.to_string(),
                    "value": value,
                    "unit": "",
                    "obs_status": "",
                    "decimal": 0
                })
            })
            .collect();

        json!([
            {
                "page": 1,
                "pages": 1,
                "per_page": 1000,
                "total": records.len(),
                "sourceid": "2",
                "lastupdated": "2025-07-01"
            },
            records
        ])
    }

    /// Envelope the API sends when an indicator has nothing for the range
    pub fn no_data_body() -> Value {
        json!([{"page": 0, "pages": 0, "per_page": 1000, "total": 0}, null])
    }

    pub fn indicator_path(code: &str) -> String {
        format!("/country/IN/indicator/{}", code)
    }

    /// Serve `body` for `code` over `years`, expecting exactly one request
    pub async fn mount_indicator(server: &MockServer, code: &str, years: YearRange, body: Value) {
        Mock::given(method("GET"))
            .and(path(indicator_path(code)))
            .and(query_param("date", years.as_query()))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    pub fn test_config(base_url: &str, dir: &Path, start: i32, end: i32) -> Config {
        let years = YearRange::new(start, end).expect("valid test range");
        Config {
            base_url: base_url.to_string(),
            years,
            timeout_secs: 5,
            output_path: dir.join(format!("india_gdp_{}_{}.csv", start, end)),
            ..Config::default()
        }
    }
}

/// Logging utilities for tests
pub mod logging {
    use tracing::{debug, info};

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
