use serde::{Deserialize, Serialize};

use crate::category::{Category, DetectedCategory};

/// Minimum confidence the engine asks the detector for, and re-checks itself.
pub const MIN_LABEL_CONFIDENCE: f64 = 70.0;

/// Labels requested per image.
pub const MAX_LABELS: usize = 5;

/// Top-label confidence needed for `verified`.
pub const CONFIDENCE_THRESHOLD: f64 = 75.0;

/// One listing-creation attempt: where the photo lives and what the user
/// says it shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub image_url: String,
    pub declared_category: Category,
}

/// Label returned by the image labeling service. Confidence is on a 0-100
/// scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLabel {
    pub name: String,
    pub confidence: f64,
}

impl DetectedLabel {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self { name: name.into(), confidence }
    }
}

/// Highest-confidence label at or above `min_confidence`.
///
/// Ties keep the earliest label, so the same detector output always picks
/// the same label. NaN confidences never qualify.
pub fn top_label(labels: &[DetectedLabel], min_confidence: f64) -> Option<&DetectedLabel> {
    labels
        .iter()
        .filter(|l| l.confidence >= min_confidence)
        .fold(None, |best: Option<&DetectedLabel>, label| match best {
            Some(b) if label.confidence <= b.confidence => Some(b),
            _ => Some(label),
        })
}

/// The verdict handed back to the listing workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified: bool,
    pub detected_category: DetectedCategory,
    pub confidence_score: f64,
    pub is_authentic_image: bool,
}

impl VerificationResult {
    /// Returned when the detector has nothing to say about the image.
    pub fn unknown() -> Self {
        Self {
            verified: false,
            detected_category: DetectedCategory::Unknown,
            confidence_score: 0.0,
            is_authentic_image: false,
        }
    }
}

/// Identity of the fetched bytes, logged so a verdict can be tied back to
/// the exact image it was made on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEvidence {
    pub sha256: String,
    pub phash: String,
    pub byte_len: usize,
    pub width: u32,
    pub height: u32,
    pub fetched_at: i64,
}
