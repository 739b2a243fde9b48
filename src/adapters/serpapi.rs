use async_trait::async_trait;
use serde_json::Value;

use super::ensure_success;
use crate::error::{SignalError, SignalResult};
use crate::services::{ReverseImageSearchService, SearchMatch};

pub const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search";

/// Google reverse image search through SerpApi.
#[derive(Clone)]
pub struct SerpApiReverseSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SerpApiReverseSearch {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

/// Collects `image_results[].link`. Entries without a string link are
/// skipped; a missing `image_results` array is malformed.
pub fn parse_image_results(body: &Value) -> SignalResult<Vec<SearchMatch>> {
    let results = body
        .get("image_results")
        .and_then(Value::as_array)
        .ok_or_else(|| SignalError::Malformed("no image_results list".into()))?;

    Ok(results
        .iter()
        .filter_map(|r| r.get("link").and_then(Value::as_str))
        .map(|link| SearchMatch { url: link.to_string() })
        .collect())
}

#[async_trait]
impl ReverseImageSearchService for SerpApiReverseSearch {
    async fn search(&self, image_url: &str) -> SignalResult<Vec<SearchMatch>> {
        let request = self.client.get(&self.endpoint).query(&[
            ("engine", "google_reverse_image"),
            ("image_url", image_url),
            ("api_key", self.api_key.as_str()),
            ("no_cache", "true"),
        ]);

        let response = ensure_success(request.send().await?).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| SignalError::Malformed(e.to_string()))?;

        parse_image_results(&body)
    }
}
