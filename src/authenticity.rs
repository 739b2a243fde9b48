use std::sync::Arc;

use crate::services::GenerativeImageScoringService;

/// Scores at or above this are treated as machine generated.
pub const AI_GENERATED_CUTOFF: f64 = 0.5;

/// Decides whether a photo is a real photograph.
///
/// Any failure of the scoring service yields `false` ("not authentic").
#[derive(Clone)]
pub struct AuthenticityChecker {
    scorer: Arc<dyn GenerativeImageScoringService>,
}

impl AuthenticityChecker {
    pub fn new(scorer: Arc<dyn GenerativeImageScoringService>) -> Self {
        Self { scorer }
    }

    pub async fn is_authentic(&self, image_url: &str) -> bool {
        match self.scorer.score(image_url).await {
            Ok(score) if (0.0..=1.0).contains(&score) => {
                let authentic = score < AI_GENERATED_CUTOFF;
                tracing::info!(image_url, score, authentic, "authenticity scored");
                authentic
            }
            Ok(score) => {
                tracing::warn!(
                    image_url,
                    score,
                    "authenticity score out of range, treating image as not authentic"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    image_url,
                    error = %e,
                    "authenticity check failed, treating image as not authentic"
                );
                false
            }
        }
    }
}
