pub mod api;
pub mod cleaning;
pub mod concurrent_fetcher;
pub mod data_collector;
pub mod error;
pub mod models;
pub mod output;
