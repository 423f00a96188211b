//! Feed port: retrieval of the external tabular activity feed.

use std::future::Future;

use nightrelay_domain::error::NightRelayError;

/// Fetches the raw text of the external feed.
///
/// Implementations must bound the request in time. Any transport failure
/// or non-success status is reported as [`NightRelayError::Upstream`];
/// callers treat it as "no signal".
pub trait FeedSource {
    fn fetch(&self) -> impl Future<Output = Result<String, NightRelayError>> + Send;
}
