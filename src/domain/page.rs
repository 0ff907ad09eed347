use serde::{Serialize, Serializer};
use thiserror::Error;

/// Why a single page could not be turned into text. Recorded on the page,
/// never propagated out of a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("not text content: {0}")]
    UnsupportedContentType(String),
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("failed to read body: {0}")]
    Body(String),
}

impl Serialize for FetchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub url: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FetchError>,
}

impl Page {
    pub fn failed(url: impl Into<String>, status_code: u16, error: FetchError) -> Self {
        Self {
            url: url.into(),
            status_code,
            text: String::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
