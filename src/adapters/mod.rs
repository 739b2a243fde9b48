//! reqwest-backed implementations of the capability traits in `services`.

pub mod fetcher;
pub mod labels;
pub mod serpapi;
pub mod sightengine;

pub use fetcher::HttpImageFetcher;
pub use labels::HttpLabelDetector;
pub use serpapi::SerpApiReverseSearch;
pub use sightengine::SightengineScorer;

use std::time::Duration;

use crate::error::{SignalError, SignalResult};

/// One pooled client per process, shared by all adapters. Both timeouts
/// apply to every call so no external system can stall a verification.
pub fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .user_agent(concat!("trash2cash-core/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Turns a non-2xx response into `SignalError::Status`, keeping the body
/// for the audit log.
pub(crate) async fn ensure_success(response: reqwest::Response) -> SignalResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SignalError::Status { status: status.as_u16(), body })
}
