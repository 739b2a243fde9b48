use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinHandle};

use crate::authenticity::AuthenticityChecker;
use crate::category::{Category, DetectedCategory, KeywordTable};
use crate::error::{VerifyError, VerifyResult};
use crate::evidence::{
    top_label, VerificationRequest, VerificationResult, CONFIDENCE_THRESHOLD, MAX_LABELS,
    MIN_LABEL_CONFIDENCE,
};
use crate::fingerprint;
use crate::reuse::ReuseChecker;
use crate::services::{ImageBytesFetcher, ImageLabelingService};

/// Combines label detection, authenticity and reuse signals into one
/// verdict per listing photo.
///
/// Holds only shared clients and immutable reference data, so a single
/// engine behind an `Arc` serves any number of concurrent requests.
pub struct VerificationEngine {
    fetcher: Arc<dyn ImageBytesFetcher>,
    labeler: Arc<dyn ImageLabelingService>,
    authenticity: AuthenticityChecker,
    reuse: ReuseChecker,
    keywords: Arc<KeywordTable>,
}

impl VerificationEngine {
    pub fn new(
        fetcher: Arc<dyn ImageBytesFetcher>,
        labeler: Arc<dyn ImageLabelingService>,
        authenticity: AuthenticityChecker,
        reuse: ReuseChecker,
    ) -> Self {
        Self {
            fetcher,
            labeler,
            authenticity,
            reuse,
            keywords: Arc::new(KeywordTable::builtin().clone()),
        }
    }

    pub fn with_keywords(mut self, keywords: KeywordTable) -> Self {
        self.keywords = Arc::new(keywords);
        self
    }

    pub async fn verify_request(
        &self,
        req: &VerificationRequest,
    ) -> VerifyResult<VerificationResult> {
        self.verify(&req.image_url, req.declared_category).await
    }

    /// Only an unusable image (or a labeler outage) is an error. A photo
    /// that fails the checks is an `Ok` result with `verified: false`.
    pub async fn verify(
        &self,
        image_url: &str,
        declared: Category,
    ) -> VerifyResult<VerificationResult> {
        // 1. pixels
        let bytes = match self.fetcher.fetch(image_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(image_url, error = %e, "image fetch failed, no verdict");
                return Err(e);
            }
        };

        let (evidence, bytes) = tokio::task::spawn_blocking(move || {
            fingerprint::fingerprint_image(&bytes).map(|ev| (ev, bytes))
        })
        .await
        .map_err(|e| VerifyError::Internal(format!("fingerprint task failed: {}", e)))?
        .map_err(|reason| {
            tracing::error!(image_url, %reason, "image bytes are not a decodable image");
            VerifyError::ImageUndecodable {
                locator: image_url.to_string(),
                reason,
            }
        })?;
        tracing::debug!(
            image_url,
            sha256 = %evidence.sha256,
            phash = %evidence.phash,
            width = evidence.width,
            height = evidence.height,
            byte_len = evidence.byte_len,
            fetched_at = evidence.fetched_at,
            "image fingerprinted"
        );

        // 2. labels
        let labels = match self
            .labeler
            .detect_labels(&bytes, MAX_LABELS, MIN_LABEL_CONFIDENCE)
            .await
        {
            Ok(labels) => labels,
            Err(e) => {
                tracing::error!(image_url, error = %e, "label detection failed, no verdict");
                return Err(VerifyError::LabelDetection(e));
            }
        };

        // 3. top label -> category
        let Some(top) = top_label(&labels, MIN_LABEL_CONFIDENCE) else {
            tracing::info!(
                image_url,
                sha256 = %evidence.sha256,
                returned = labels.len(),
                "no label above minimum confidence, result is UNKNOWN"
            );
            return Ok(VerificationResult::unknown());
        };
        let mapped = self.keywords.map_label(&top.name);
        let confidence = top.confidence;

        // 4. independent signals, run side by side
        let authenticity = self.authenticity.clone();
        let reuse = self.reuse.clone();
        let auth_url = image_url.to_string();
        let reuse_url = image_url.to_string();
        let auth_task = AbortOnDrop(tokio::spawn(async move {
            authenticity.is_authentic(&auth_url).await
        }));
        let reuse_task = AbortOnDrop(tokio::spawn(async move {
            reuse.is_reused(&reuse_url).await
        }));
        let (authentic, reused) = tokio::join!(auth_task, reuse_task);
        let authentic = signal_or_default("authenticity", authentic, false);
        let reused = signal_or_default("reuse", reused, false);

        // 5-7. fusion
        let result = fuse(mapped, confidence, declared, authentic, reused);

        // 8. audit record
        tracing::info!(
            image_url,
            sha256 = %evidence.sha256,
            byte_len = evidence.byte_len,
            fetched_at = evidence.fetched_at,
            top_label = %top.name,
            declared = %declared,
            detected_category = %result.detected_category,
            authentic_image = result.is_authentic_image,
            reused,
            category_match = result.detected_category.matches(declared),
            confidence,
            verified = result.verified,
            "verification summary"
        );

        Ok(result)
    }
}

/// The decision policy.
///
/// `verified` looks only at category agreement and label confidence; the
/// authenticity signals are reported in `is_authentic_image` but do not
/// gate it.
pub fn fuse(
    detected: Category,
    confidence: f64,
    declared: Category,
    authentic: bool,
    reused: bool,
) -> VerificationResult {
    let detected = DetectedCategory::Known(detected);
    let category_match = detected.matches(declared);
    VerificationResult {
        verified: category_match && confidence >= CONFIDENCE_THRESHOLD,
        detected_category: detected,
        confidence_score: confidence,
        is_authentic_image: authentic && !reused,
    }
}

fn signal_or_default(
    signal: &'static str,
    joined: Result<bool, JoinError>,
    default: bool,
) -> bool {
    joined.unwrap_or_else(|e| {
        tracing::warn!(
            signal,
            error = %e,
            default,
            "signal task did not complete, using default"
        );
        default
    })
}

/// Aborts the spawned check when the verification itself is dropped, e.g.
/// because the HTTP caller went away or the request timed out.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}
