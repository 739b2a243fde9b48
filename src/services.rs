//! Capability interfaces for the external systems the engine consults.
//!
//! Implementations live in `adapters`; tests swap in in-memory fakes.

use async_trait::async_trait;

use crate::error::{SignalResult, VerifyResult};
use crate::evidence::DetectedLabel;

/// Pulls the raw bytes of a listing photo.
#[async_trait]
pub trait ImageBytesFetcher: Send + Sync {
    async fn fetch(&self, image_url: &str) -> VerifyResult<Vec<u8>>;
}

/// Object / scene labeling.
#[async_trait]
pub trait ImageLabelingService: Send + Sync {
    async fn detect_labels(
        &self,
        image_bytes: &[u8],
        max_labels: usize,
        min_confidence: f64,
    ) -> SignalResult<Vec<DetectedLabel>>;
}

/// Likelihood in [0, 1] that an image was machine generated.
#[async_trait]
pub trait GenerativeImageScoringService: Send + Sync {
    async fn score(&self, image_url: &str) -> SignalResult<f64>;
}

/// Pages on which a visually matching image was found.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub url: String,
}

#[async_trait]
pub trait ReverseImageSearchService: Send + Sync {
    async fn search(&self, image_url: &str) -> SignalResult<Vec<SearchMatch>>;
}
