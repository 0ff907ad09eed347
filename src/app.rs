use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};

use crate::{
    banlist::BanlistStore,
    config::AppConfig,
    crawler::Crawler,
    detector::Detector,
    domain::{Page, ScanResult},
    html::extract_text,
    report::SiteReport,
};

/// Local files above this size are skipped instead of scanned.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Site(String),
    File(PathBuf),
}

/// An explicit http(s) scheme is always a site. A bare name with a dot is a
/// site only when no such local path exists, so an existing `notes.html` is
/// read as a file.
pub fn classify_target(raw: &str) -> Target {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Target::Site(raw.to_string());
    }
    let looks_like_domain = raw.contains('.')
        && !raw.starts_with('.')
        && !raw.starts_with('/');
    if looks_like_domain && !Path::new(raw).exists() {
        return Target::Site(raw.to_string());
    }
    Target::File(PathBuf::from(raw))
}

fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// Text ready to scan, or `None` for an item that failed to load.
struct Item {
    source: String,
    text: Option<String>,
}

impl From<Page> for Item {
    fn from(page: Page) -> Self {
        let text = page.is_ok().then_some(page.text);
        Item {
            source: page.url,
            text,
        }
    }
}

pub struct SlopApp {
    config: Arc<AppConfig>,
    detector: Detector,
}

impl SlopApp {
    pub fn initialize(config: AppConfig) -> Result<Self> {
        let store = BanlistStore::load(
            &config.banlist.base_source(),
            &config.banlist.presets,
            config.banlist.preset_dir.as_deref(),
        )
        .context("failed to load banlist")?;
        Ok(Self {
            config: Arc::new(config),
            detector: Detector::new(Arc::new(store)),
        })
    }

    /// Reports every target in turn, writing each report to stdout as it
    /// completes. A failing target is logged and does not stop the rest.
    pub async fn run(&self, targets: &[String]) -> Result<()> {
        let mut failed = 0usize;
        for target in targets {
            let report = tokio::select! {
                report = self.report_target(target) => report,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!(target: "app", %target, "interrupted");
                    anyhow::bail!("interrupted while processing {target}");
                }
            };
            match report {
                Ok(report) => emit(&report)?,
                Err(err) => {
                    failed += 1;
                    tracing::error!(target: "app", %target, error = %format!("{err:#}"), "target failed");
                }
            }
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {} targets failed", targets.len());
        }
        Ok(())
    }

    pub async fn report_target(&self, target: &str) -> Result<SiteReport> {
        match classify_target(target) {
            Target::Site(root) => self.report_site(&root).await,
            Target::File(path) => self.report_file(&path).await,
        }
    }

    async fn report_site(&self, root: &str) -> Result<SiteReport> {
        let crawler = Crawler::new(root, self.config.crawl.options())
            .with_context(|| format!("cannot crawl {root}"))?;
        let root = crawler.root().to_string();
        tracing::info!(target: "app", %root, "crawling");

        let pages = crawler
            .crawl(|count, url| {
                tracing::debug!(target: "app", count, url, "page fetched");
            })
            .await;
        let total = pages.len();
        let (results, skipped) = self.scan_items(pages.into_iter().map(Item::from));
        Ok(SiteReport::build(root, results, total, skipped))
    }

    async fn report_file(&self, path: &Path) -> Result<SiteReport> {
        let source = path.display().to_string();
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("cannot read {source}"))?;
        if metadata.is_dir() {
            anyhow::bail!("{source} is a directory; pass individual files");
        }

        let item = if metadata.len() > MAX_FILE_BYTES {
            tracing::warn!(target: "app", file = %source, size = metadata.len(), "file too large, skipping");
            Item {
                source: source.clone(),
                text: None,
            }
        } else {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("cannot read {source}"))?;
            let raw = String::from_utf8_lossy(&bytes);
            let text = if is_html_path(path) {
                extract_text(&raw)
            } else {
                raw.into_owned()
            };
            Item {
                source: source.clone(),
                text: Some(text),
            }
        };

        let (results, skipped) = self.scan_items(std::iter::once(item));
        Ok(SiteReport::build(source, results, 1, skipped))
    }

    /// Scans every loaded item with at least `min_words` words. Returns the
    /// results and the number of items skipped.
    fn scan_items(&self, items: impl Iterator<Item = Item>) -> (Vec<ScanResult>, usize) {
        let min_words = self.config.report.min_words;
        let mut results = Vec::new();
        let mut skipped = 0;
        for item in items {
            let Some(text) = item.text else {
                skipped += 1;
                continue;
            };
            if text.split_whitespace().count() < min_words {
                skipped += 1;
                continue;
            }
            results.push(self.detector.scan(&text).with_source(item.source));
        }
        (results, skipped)
    }
}

fn emit(report: &SiteReport) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, report).context("failed to write report")?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{config::AppConfig, domain::Rating};

    fn app(min_words: &str) -> SlopApp {
        let config = AppConfig::from_lookup(|key| match key {
            "SLOP_MIN_WORDS" => Some(min_words.to_string()),
            _ => None,
        })
        .unwrap();
        SlopApp::initialize(config).unwrap()
    }

    #[test]
    fn classifies_urls_domains_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("page.html");
        fs::write(&existing, "<p>hi</p>").unwrap();

        assert_eq!(
            classify_target("https://example.com/blog"),
            Target::Site("https://example.com/blog".into())
        );
        assert_eq!(
            classify_target("example.com"),
            Target::Site("example.com".into())
        );
        assert_eq!(
            classify_target("example.com/blog"),
            Target::Site("example.com/blog".into())
        );
        let nested = dir.path().join("site.dir").join("post.txt");
        fs::create_dir_all(nested.parent().unwrap()).unwrap();
        fs::write(&nested, "words").unwrap();
        let nested = nested.to_string_lossy().into_owned();
        assert_eq!(classify_target(&nested), Target::File(PathBuf::from(&nested)));
        let existing = existing.to_string_lossy().into_owned();
        assert_eq!(
            classify_target(&existing),
            Target::File(PathBuf::from(&existing))
        );
        assert_eq!(classify_target("README"), Target::File("README".into()));
        assert_eq!(classify_target("./draft.txt"), Target::File("./draft.txt".into()));
    }

    #[tokio::test]
    async fn html_file_is_extracted_before_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.html");
        fs::write(
            &path,
            "<html><script>var delve = 1;</script><body><p>We delve into a rich tapestry of \
             ideas and leverage every insight to shed light on the topic at hand today.</p></body></html>",
        )
        .unwrap();

        let report = app("10").report_file(&path).await.unwrap();
        assert_eq!(report.total_items, 1);
        assert_eq!(report.scanned, 1);
        let item = &report.items[0];
        assert!(item.hits.iter().any(|hit| hit.matched_text == "delve"));
        assert!(item.hits.iter().all(|hit| hit.line == 1));
        assert_ne!(item.rating, Rating::Clean);
    }

    #[tokio::test]
    async fn short_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        fs::write(&path, "just a few words").unwrap();

        let report = app("10").report_file(&path).await.unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rating, Rating::Clean);
    }

    #[tokio::test]
    async fn missing_file_and_directory_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = app("1");
        assert!(app.report_file(&dir.path().join("absent.txt")).await.is_err());
        assert!(app.report_file(dir.path()).await.is_err());
    }

    #[test]
    fn failed_pages_count_as_skipped() {
        let app = app("2");
        let pages = vec![
            Page {
                url: "https://example.com/".into(),
                status_code: 200,
                text: "Let us delve deeper".into(),
                error: None,
            },
            Page::failed(
                "https://example.com/gone",
                404,
                crate::domain::FetchError::Status(404),
            ),
            Page {
                url: "https://example.com/tiny".into(),
                status_code: 200,
                text: "tiny".into(),
                error: None,
            },
        ];
        let (results, skipped) = app.scan_items(pages.into_iter().map(Item::from));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "https://example.com/");
        assert_eq!(skipped, 2);
    }
}
