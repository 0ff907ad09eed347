use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use url::Url;

use super::{
    fetch::read_limited,
    links::{is_asset_path, same_site},
    CRAWLER_NAME,
};

pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);
const ROBOTS_MAX_BYTES: usize = 512 * 1024;
const SITEMAP_MAX_BYTES: usize = 2 * 1024 * 1024;

static LOC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<loc>\s*([^<]+?)\s*</loc>").expect("valid loc regex"));

#[derive(Debug, Clone)]
enum Rule {
    Prefix(String),
    Wildcard { raw: String, regex: Regex },
}

/// Disallow rules for one agent. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    rules: Vec<Rule>,
}

impl RobotsRules {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rules = paths.into_iter().map(|path| compile_rule(path.into())).collect();
        Self { rules }
    }

    /// Uses the block addressed to `user_agent` when it has any rules,
    /// otherwise the `*` block. The two are never merged.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let agent_lower = user_agent.to_lowercase();
        let mut ours = Vec::new();
        let mut wildcard = Vec::new();
        let mut in_ours = false;
        let mut in_wildcard = false;
        let mut previous_was_agent = false;

        for raw_line in content.lines() {
            let line = raw_line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                previous_was_agent = false;
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    let token = value.to_lowercase();
                    let matches_ours = !token.is_empty()
                        && token != "*"
                        && (agent_lower.contains(&token)
                            || token.contains(&agent_lower)
                            || token.contains(CRAWLER_NAME));
                    // Consecutive User-agent lines share one group.
                    if previous_was_agent {
                        in_ours |= matches_ours;
                        in_wildcard |= token == "*";
                    } else {
                        in_ours = matches_ours;
                        in_wildcard = token == "*";
                    }
                    previous_was_agent = true;
                }
                "disallow" => {
                    previous_was_agent = false;
                    if value.is_empty() {
                        continue;
                    }
                    if in_ours {
                        ours.push(value.to_string());
                    }
                    if in_wildcard {
                        wildcard.push(value.to_string());
                    }
                }
                _ => previous_was_agent = false,
            }
        }

        if ours.is_empty() {
            Self::from_paths(wildcard)
        } else {
            Self::from_paths(ours)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Prefix rules are literal: `/admin` also blocks `/administrator`, as in
    /// standard robots.txt semantics.
    pub fn is_disallowed(&self, url: &Url) -> bool {
        self.is_path_disallowed(url.path())
    }

    pub fn is_path_disallowed(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| match rule {
            Rule::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Rule::Wildcard { raw, regex } => {
                path.starts_with(raw.as_str()) || regex.is_match(path)
            }
        })
    }
}

fn compile_rule(path: String) -> Rule {
    if !path.contains('*') {
        return Rule::Prefix(path);
    }
    let mut pattern = regex::escape(&path).replace(r"\*", ".*");
    if let Some(stripped) = pattern.strip_suffix(r"\$") {
        pattern = format!("{stripped}$");
    }
    match Regex::new(&format!("^{pattern}")) {
        Ok(regex) => Rule::Wildcard { raw: path, regex },
        Err(err) => {
            tracing::warn!(target: "robots", rule = %path, error = %err, "treating rule as prefix");
            Rule::Prefix(path)
        }
    }
}

fn site_file(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    url
}

async fn fetch_small(client: &Client, url: Url, limit: usize) -> Option<String> {
    let response = match client.get(url.clone()).timeout(ROBOTS_TIMEOUT).send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(target: "robots", url = %url, error = %err, "fetch failed");
            return None;
        }
    };
    if response.status() != StatusCode::OK {
        tracing::debug!(target: "robots", url = %url, status = %response.status(), "not available");
        return None;
    }
    match read_limited(response, limit).await {
        Ok((body, _truncated)) => Some(String::from_utf8_lossy(&body).into_owned()),
        Err(err) => {
            tracing::debug!(target: "robots", url = %url, error = %err, "body read failed");
            None
        }
    }
}

/// Fetches `/robots.txt` for the base host. Never fails: unavailable robots
/// means no restrictions.
pub async fn fetch_robots(client: &Client, base: &Url, user_agent: &str) -> RobotsRules {
    let url = site_file(base, "/robots.txt");
    match fetch_small(client, url, ROBOTS_MAX_BYTES).await {
        Some(body) => RobotsRules::parse(&body, user_agent),
        None => RobotsRules::default(),
    }
}

/// Page URLs listed in the `<loc>` elements of a sitemap document, restricted
/// to the base site and with asset URLs removed.
pub fn parse_sitemap(body: &str, base: &Url) -> Vec<Url> {
    LOC_REGEX
        .captures_iter(body)
        .filter_map(|capture| Url::parse(capture[1].trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https") && same_site(url, base))
        .filter(|url| !is_asset_path(url.path()))
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .collect()
}

/// Fetches `/sitemap.xml` for the base host. Never fails.
pub async fn fetch_sitemap(client: &Client, base: &Url) -> Vec<Url> {
    let url = site_file(base, "/sitemap.xml");
    match fetch_small(client, url, SITEMAP_MAX_BYTES).await {
        Some(body) => parse_sitemap(&body, base),
        None => Vec::new(),
    }
}
