//! # nightrelay-adapter-feed-reqwest
//!
//! External feed adapter using [reqwest](https://docs.rs/reqwest).
//!
//! Fetches the published tabular feed (typically a spreadsheet exported as
//! CSV) with a bounded timeout. Interpretation of the body is left to the
//! application layer.
//!
//! ## Dependency rule
//! Depends on `nightrelay-app` (for the `FeedSource` port) and
//! `nightrelay-domain` (for the error type).

use std::time::Duration;

use nightrelay_app::ports::FeedSource;
use nightrelay_domain::error::NightRelayError;

/// Errors originating from the feed HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The HTTP client could not be constructed.
    #[error("unable to build http client")]
    Client(#[source] reqwest::Error),
    /// The request failed, timed out, or returned a non-success status.
    #[error("feed request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<FeedError> for NightRelayError {
    fn from(err: FeedError) -> Self {
        Self::Upstream(Box::new(err))
    }
}

/// [`FeedSource`] issuing one GET per fetch.
///
/// The client is built once and reused so connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    /// Create a source for `url` where each request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Client`] if the TLS backend cannot be initialised.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FeedError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_body(&self) -> Result<String, FeedError> {
        let request_error = |source| FeedError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(request_error)?;

        let body = response.text().await.map_err(request_error)?;
        tracing::debug!(url = %self.url, bytes = body.len(), "feed fetched");
        Ok(body)
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<String, NightRelayError> {
        Ok(self.fetch_body().await?)
    }
}
