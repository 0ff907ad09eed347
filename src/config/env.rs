use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{banlist::BaseSource, crawler::CrawlOptions};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub banlist: BanlistConfig,
    pub report: ReportConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_depth: usize,
    pub max_pages: usize,
    pub concurrency: usize,
    pub delay: Duration,
    pub user_agent: String,
}

impl CrawlConfig {
    pub fn options(&self) -> CrawlOptions {
        CrawlOptions {
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            concurrency: self.concurrency,
            delay: self.delay,
            user_agent: self.user_agent.clone(),
        }
        .normalized()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BanlistConfig {
    /// Preset names or paths, merged in order.
    pub presets: Vec<String>,
    pub preset_dir: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
}

impl BanlistConfig {
    pub fn base_source(&self) -> BaseSource {
        match &self.base_dir {
            Some(dir) => BaseSource::Directory(dir.clone()),
            None => BaseSource::Embedded,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Items with fewer words are skipped rather than scored.
    pub min_words: usize,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
