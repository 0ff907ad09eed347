use std::time::Duration;

use futures::StreamExt;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    redirect::Policy,
    Client, Response, StatusCode,
};
use url::Url;

use crate::{
    domain::{FetchError, Page},
    html::extract_text,
};

use super::CrawlError;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_REDIRECTS: usize = 5;
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// A fetched page plus, on success, the raw HTML needed for link discovery.
/// The HTML is dropped as soon as links are extracted.
#[derive(Debug)]
pub struct FetchedPage {
    pub page: Page,
    pub raw_html: Option<String>,
    /// Final URL after redirects; relative links resolve against it.
    pub final_url: Url,
}

pub fn build_client(user_agent: &str) -> Result<Client, CrawlError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(FETCH_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(CrawlError::Client)
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Never fails: every problem is recorded on the returned page.
    pub async fn fetch(&self, url: &Url) -> FetchedPage {
        let failed = |status: u16, error: FetchError| FetchedPage {
            page: Page::failed(url.as_str(), status, error),
            raw_html: None,
            final_url: url.clone(),
        };

        let response = match self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/html, text/plain;q=0.9")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return failed(0, FetchError::Request(err.to_string())),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return failed(status.as_u16(), FetchError::Status(status.as_u16()));
        }
        let status = status.as_u16();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.contains("text/html") && !content_type.contains("text/plain") {
            let shown = if content_type.is_empty() {
                "missing content-type".to_string()
            } else {
                content_type
            };
            return failed(status, FetchError::UnsupportedContentType(shown));
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_BODY_BYTES as u64)
        {
            return failed(status, FetchError::TooLarge { limit: MAX_BODY_BYTES });
        }

        let final_url = response.url().clone();
        let body = match read_limited(response, MAX_BODY_BYTES).await {
            Ok((_, true)) => {
                return failed(status, FetchError::TooLarge { limit: MAX_BODY_BYTES })
            }
            Ok((body, false)) => body,
            Err(err) => return failed(status, FetchError::Body(err.to_string())),
        };

        let raw = String::from_utf8_lossy(&body).into_owned();
        let text = extract_text(&raw);
        FetchedPage {
            page: Page {
                url: url.to_string(),
                status_code: status,
                text,
                error: None,
            },
            raw_html: Some(raw),
            final_url,
        }
    }
}

/// Reads at most `limit` bytes of the body. The flag reports whether more
/// data was available past the limit.
pub async fn read_limited(
    response: Response,
    limit: usize,
) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let remaining = limit - body.len();
        if chunk.len() > remaining {
            body.extend_from_slice(&chunk[..remaining]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}
