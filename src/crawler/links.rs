use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::CrawlError;

static HREF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
});

const ASSET_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".woff", ".woff2", ".ttf",
    ".eot", ".mp3", ".mp4", ".webm", ".webp", ".pdf", ".zip", ".tar", ".gz", ".xml", ".json",
    ".rss", ".atom",
];

/// Parses a crawl root, defaulting bare domains to `https://`.
pub fn normalize_root_url(raw: &str) -> Result<Url, CrawlError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| CrawlError::InvalidRootUrl {
        url: raw.to_string(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("empty url".into()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let mut url = Url::parse(&candidate).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    url.set_fragment(None);
    Ok(url)
}

pub fn is_asset_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn same_site(url: &Url, base: &Url) -> bool {
    url.host_str() == base.host_str() && url.port() == base.port()
}

/// Same-site HTTP(S) page links found in `html`, resolved against `page_url`,
/// fragment-stripped and deduplicated in document order.
pub fn extract_links(html: &str, page_url: &Url, base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for capture in HREF_REGEX.captures_iter(html) {
        let href = capture[1].trim();
        let Ok(mut resolved) = page_url.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") || !same_site(&resolved, base) {
            continue;
        }
        resolved.set_fragment(None);
        if is_asset_path(resolved.path()) {
            continue;
        }
        if seen.insert(resolved.as_str().to_string()) {
            links.push(resolved);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn bare_domain_defaults_to_https() {
        let root = normalize_root_url("example.com").unwrap();
        assert_eq!(root.as_str(), "https://example.com/");

        let root = normalize_root_url("http://example.com/docs#intro").unwrap();
        assert_eq!(root.as_str(), "http://example.com/docs");
    }

    #[test]
    fn malformed_roots_are_rejected() {
        for raw in ["", "   ", "ftp://example.com", "https://", "http://exa mple.com"] {
            assert!(
                matches!(normalize_root_url(raw), Err(CrawlError::InvalidRootUrl { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn extracts_same_site_page_links() {
        let base = url("https://example.com/");
        let page = url("https://example.com/blog/post");
        let html = r##"
            <a href="/about">About</a>
            <a href='next'>Next</a>
            <a href="/about#team">Team</a>
            <a href="https://example.com/contact?x=1#form">Contact</a>
            <a href="https://other.org/">Elsewhere</a>
            <a href="mailto:hi@example.com">Mail</a>
            <link href="/static/site.CSS" rel="stylesheet">
            <a href="/feed.xml">Feed</a>
            <a HREF = "/upper">Upper</a>
        "##;
        let links: Vec<String> = extract_links(html, &page, &base)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/about",
                "https://example.com/blog/next",
                "https://example.com/contact?x=1",
                "https://example.com/upper",
            ]
        );
    }

    #[test]
    fn explicit_port_must_match() {
        let base = url("http://127.0.0.1:8080/");
        let html = r#"<a href="http://127.0.0.1:9090/x">x</a><a href="/y">y</a>"#;
        let links = extract_links(html, &base, &base);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path(), "/y");
    }

    #[test]
    fn asset_paths_are_case_insensitive() {
        assert!(is_asset_path("/img/LOGO.PNG"));
        assert!(is_asset_path("/sitemap.xml"));
        assert!(!is_asset_path("/docs/guide"));
        assert!(!is_asset_path("/docs/page.html"));
    }
}
