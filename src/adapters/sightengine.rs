use async_trait::async_trait;
use serde_json::Value;

use super::ensure_success;
use crate::error::{SignalError, SignalResult};
use crate::services::GenerativeImageScoringService;

pub const DEFAULT_ENDPOINT: &str = "https://api.sightengine.com/1.0/check.json";

/// Sightengine `genai` model: returns `type.ai_generated` in [0, 1].
#[derive(Clone)]
pub struct SightengineScorer {
    client: reqwest::Client,
    endpoint: String,
    api_user: String,
    api_secret: String,
}

impl SightengineScorer {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_user: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_user: api_user.into(),
            api_secret: api_secret.into(),
        }
    }
}

/// Pulls `type.ai_generated` out of a check.json body.
pub fn parse_ai_generated(body: &Value) -> SignalResult<f64> {
    body.get("type")
        .and_then(|t| t.get("ai_generated"))
        .ok_or_else(|| SignalError::Malformed("no type.ai_generated in response".into()))?
        .as_f64()
        .ok_or_else(|| SignalError::Malformed("type.ai_generated is not a number".into()))
}

#[async_trait]
impl GenerativeImageScoringService for SightengineScorer {
    async fn score(&self, image_url: &str) -> SignalResult<f64> {
        let request = self.client.get(&self.endpoint).query(&[
            ("url", image_url),
            ("models", "genai"),
            ("api_user", self.api_user.as_str()),
            ("api_secret", self.api_secret.as_str()),
        ]);

        let response = ensure_success(request.send().await?).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| SignalError::Malformed(e.to_string()))?;
        tracing::debug!(image_url, response = %body, "sightengine response");

        parse_ai_generated(&body)
    }
}
