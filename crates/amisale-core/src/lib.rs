pub mod app_config;
pub mod config;
pub mod records;

pub use app_config::CrawlConfig;
pub use config::{load_crawl_config, load_crawl_config_from_env};
pub use records::{format_jpy, format_percent, format_thousands, NormalizedRecord, RawItem, ReportRow};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
