use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("all-locales fetch timed out")]
    Timeout,
    #[error("all-locales fetch failed")]
    Http(#[source] reqwest::Error),
    #[error("all-locales fetch returned HTTP {0}")]
    Status(u16),
}

/// Source of per-tree locale lists.
///
/// The production implementation is an HTTP GET against the tree's
/// English branch; tests substitute canned bodies.
#[async_trait]
pub trait LocaleSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`LocaleSource`] fetching `raw-file` URLs over HTTP with a bounded
/// timeout.
pub struct HttpLocaleSource {
    client: reqwest::Client,
}

impl HttpLocaleSource {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Http)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LocaleSource for HttpLocaleSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "fetching all-locales");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { FetchError::Timeout } else { FetchError::Http(e) })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(e)
            }
        })
    }
}
