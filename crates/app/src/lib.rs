pub mod config;
pub mod currency;
pub mod ingest;
pub mod processor;
pub mod summary;

pub use config::{AppConfig, ConfigError};
pub use currency::{CurrencyConverter, ExchangeRateHost, RateError, RateSource};
pub use ingest::{apply_category_rules, replace_for_report, replace_transactions, IngestError};
pub use processor::{ProcessorError, ReportProcessor, RunStats};
pub use summary::{summarize, SummaryError};
