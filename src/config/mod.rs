pub mod env;
mod loader;

pub use env::{
    AppConfig, BanlistConfig, ConfigError, CrawlConfig, DirectoryConfig, LoggingConfig,
    ReportConfig,
};
pub use loader::{load_config, DEFAULT_MIN_WORDS};
