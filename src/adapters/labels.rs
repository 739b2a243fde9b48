use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::ensure_success;
use crate::error::{SignalError, SignalResult};
use crate::evidence::DetectedLabel;
use crate::services::ImageLabelingService;

/// Label detection over a JSON endpoint speaking the DetectLabels shape:
/// the image travels inline as base64, labels come back as
/// `{"Labels":[{"Name":..,"Confidence":..}]}`.
#[derive(Clone)]
pub struct HttpLabelDetector {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpLabelDetector {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsRequest {
    image: InlineImage,
    max_labels: usize,
    min_confidence: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InlineImage {
    bytes: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<WireLabel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireLabel {
    name: String,
    confidence: f64,
}

#[async_trait]
impl ImageLabelingService for HttpLabelDetector {
    async fn detect_labels(
        &self,
        image_bytes: &[u8],
        max_labels: usize,
        min_confidence: f64,
    ) -> SignalResult<Vec<DetectedLabel>> {
        let body = DetectLabelsRequest {
            image: InlineImage {
                bytes: base64::engine::general_purpose::STANDARD.encode(image_bytes),
            },
            max_labels,
            min_confidence,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = ensure_success(request.send().await?).await?;
        let parsed: DetectLabelsResponse = response
            .json()
            .await
            .map_err(|e| SignalError::Malformed(e.to_string()))?;

        let labels: Vec<DetectedLabel> = parsed
            .labels
            .into_iter()
            .map(|l| DetectedLabel::new(l.name, l.confidence))
            .collect();
        tracing::debug!(labels = ?labels, "labels detected");
        Ok(labels)
    }
}
