pub mod fetch;
pub mod frontier;
pub mod links;
pub mod robots;

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinSet;
use url::Url;

use crate::domain::Page;

pub use fetch::{FetchedPage, PageFetcher, FETCH_TIMEOUT, MAX_BODY_BYTES, MAX_REDIRECTS};
pub use frontier::{Completion, CrawlTask, Frontier, Offer};
pub use links::{extract_links, is_asset_path, normalize_root_url};
pub use robots::{fetch_robots, fetch_sitemap, parse_sitemap, RobotsRules};

/// Matched case-insensitively against robots.txt agent tokens.
pub const CRAWLER_NAME: &str = "slopguard";
pub const DEFAULT_USER_AGENT: &str = concat!("slopguard/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_MAX_PAGES: usize = 500;
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid root url {url:?}: {reason}")]
    InvalidRootUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_depth: usize,
    pub max_pages: usize,
    pub concurrency: usize,
    /// Slept before every page fetch.
    pub delay: Duration,
    pub user_agent: String,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            delay: DEFAULT_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlOptions {
    /// Zero depth, page cap or concurrency, and a blank user agent, fall back
    /// to the defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_depth == 0 {
            self.max_depth = DEFAULT_MAX_DEPTH;
        }
        if self.max_pages == 0 {
            self.max_pages = DEFAULT_MAX_PAGES;
        }
        if self.concurrency == 0 {
            self.concurrency = DEFAULT_CONCURRENCY;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeding,
    Draining,
    Done,
}

pub type ProgressCallback = Arc<dyn Fn(usize, &str) + Send + Sync>;

struct CrawlContext {
    root: Url,
    options: CrawlOptions,
    fetcher: PageFetcher,
}

#[derive(Clone)]
pub struct Crawler {
    ctx: Arc<CrawlContext>,
}

impl Crawler {
    /// Fails only for a malformed root URL or an unusable HTTP client.
    pub fn new(root: &str, options: CrawlOptions) -> Result<Self, CrawlError> {
        let root = normalize_root_url(root)?;
        let options = options.normalized();
        let client = fetch::build_client(&options.user_agent)?;
        Ok(Self {
            ctx: Arc::new(CrawlContext {
                root,
                options,
                fetcher: PageFetcher::new(client),
            }),
        })
    }

    pub fn root(&self) -> &Url {
        &self.ctx.root
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.ctx.options
    }

    /// Crawls the site and returns every fetched page, successful or not, in
    /// completion order. `on_progress` receives the running page count and the
    /// URL just fetched.
    pub async fn crawl<F>(&self, on_progress: F) -> Vec<Page>
    where
        F: Fn(usize, &str) + Send + Sync + 'static,
    {
        let on_progress: ProgressCallback = Arc::new(on_progress);
        let ctx = &self.ctx;
        let frontier = Arc::new(Frontier::new(ctx.options.max_pages));

        log_phase(CrawlPhase::Seeding, &ctx.root);
        let client = ctx.fetcher.client();
        let rules = Arc::new(fetch_robots(client, &ctx.root, &ctx.options.user_agent).await);
        let sitemap = fetch_sitemap(client, &ctx.root).await;
        tracing::info!(
            target: "crawler",
            disallow_rules = rules.len(),
            sitemap_urls = sitemap.len(),
            max_pages = frontier.max_pages(),
            "robots and sitemap resolved"
        );

        // Keep one slot for the root.
        let seed_cap = ctx.options.max_pages.saturating_sub(1);
        for url in sitemap {
            if frontier.enqueued() >= seed_cap {
                break;
            }
            if !rules.is_disallowed(&url) {
                frontier.offer(url, 0);
            }
        }
        frontier.offer(ctx.root.clone(), 0);

        log_phase(CrawlPhase::Draining, &ctx.root);
        let pages = Arc::new(Mutex::new(Vec::new()));
        let mut workers = JoinSet::new();
        for worker_id in 0..ctx.options.concurrency {
            let worker = Worker {
                id: worker_id,
                ctx: self.ctx.clone(),
                frontier: frontier.clone(),
                rules: rules.clone(),
                pages: pages.clone(),
                on_progress: on_progress.clone(),
            };
            workers.spawn(worker.run());
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                tracing::error!(target: "crawler", error = %err, "crawl worker stopped abnormally");
            }
        }

        let pages = std::mem::take(&mut *pages.lock());
        log_phase(CrawlPhase::Done, &ctx.root);
        tracing::info!(
            target: "crawler",
            root = %ctx.root,
            pages = pages.len(),
            failed = pages.iter().filter(|page| !page.is_ok()).count(),
            "crawl finished"
        );
        pages
    }
}

fn log_phase(phase: CrawlPhase, root: &Url) {
    tracing::debug!(target: "crawler", root = %root, ?phase, "crawl phase");
}

struct Worker {
    id: usize,
    ctx: Arc<CrawlContext>,
    frontier: Arc<Frontier>,
    rules: Arc<RobotsRules>,
    pages: Arc<Mutex<Vec<Page>>>,
    on_progress: ProgressCallback,
}

impl Worker {
    async fn run(self) {
        while let Some(task) = self.frontier.next().await {
            let _completion = Completion(&self.frontier);
            self.process(task).await;
        }
        tracing::trace!(target: "crawler", worker = self.id, "worker idle, frontier drained");
    }

    async fn process(&self, task: CrawlTask) {
        if !self.ctx.options.delay.is_zero() {
            tokio::time::sleep(self.ctx.options.delay).await;
        }

        let FetchedPage {
            page,
            raw_html,
            final_url,
        } = self.ctx.fetcher.fetch(&task.url).await;

        if let Some(err) = &page.error {
            tracing::debug!(
                target: "crawler",
                url = %task.url,
                depth = task.depth,
                error = %err,
                "page fetch failed"
            );
        }

        let count = {
            let mut pages = self.pages.lock();
            pages.push(page);
            pages.len()
        };
        (self.on_progress)(count, task.url.as_str());

        let Some(html) = raw_html else {
            return;
        };
        if task.depth >= self.ctx.options.max_depth {
            return;
        }

        for link in extract_links(&html, &final_url, &self.ctx.root) {
            if self.rules.is_disallowed(&link) {
                continue;
            }
            if self.frontier.offer(link, task.depth + 1) == Offer::CapReached {
                break;
            }
        }
    }
}
