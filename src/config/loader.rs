use std::{env, path::PathBuf, str::FromStr, time::Duration};

use super::env::{
    AppConfig, BanlistConfig, ConfigError, CrawlConfig, DirectoryConfig, LoggingConfig,
    ReportConfig,
};
use crate::crawler::{
    DEFAULT_CONCURRENCY, DEFAULT_DELAY, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, DEFAULT_USER_AGENT,
};

pub const DEFAULT_MIN_WORDS: usize = 10;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|key| env::var(key).ok())
}

impl AppConfig {
    /// Builds the configuration from any key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let delay_ms = parse_or(&get, "SLOP_DELAY_MS", DEFAULT_DELAY.as_millis() as u64)?;
        let crawl = CrawlConfig {
            max_depth: parse_or(&get, "SLOP_MAX_DEPTH", DEFAULT_MAX_DEPTH)?,
            max_pages: parse_or(&get, "SLOP_MAX_PAGES", DEFAULT_MAX_PAGES)?,
            concurrency: parse_or(&get, "SLOP_CONCURRENCY", DEFAULT_CONCURRENCY)?,
            delay: Duration::from_millis(delay_ms),
            user_agent: get("SLOP_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        let banlist = BanlistConfig {
            presets: get("SLOP_PRESETS")
                .map(|value| {
                    value
                        .split(',')
                        .map(|part| part.trim().to_string())
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            preset_dir: get("SLOP_PRESET_DIR").map(PathBuf::from),
            base_dir: get("SLOP_BANLIST_DIR").map(PathBuf::from),
        };

        let report = ReportConfig {
            min_words: parse_or(&get, "SLOP_MIN_WORDS", DEFAULT_MIN_WORDS)?,
        };

        let directories = DirectoryConfig {
            logs_dir: get("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
        };

        let logging = LoggingConfig {
            level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        Ok(Self {
            crawl,
            banlist,
            report,
            directories,
            logging,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
