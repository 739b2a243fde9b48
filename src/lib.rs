//! Image verification for recycling listings.
//!
//! A listing photo is checked three ways (what it shows, whether it looks
//! machine generated, whether it already sits on a stock photo site) and
//! the signals are fused into one [`VerificationResult`].

pub mod adapters;
pub mod api;
pub mod authenticity;
pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod fingerprint;
pub mod reuse;
pub mod services;

pub use category::{map_label, Category, DetectedCategory, KeywordTable};
pub use engine::VerificationEngine;
pub use error::{SignalError, VerifyError};
pub use evidence::{DetectedLabel, VerificationRequest, VerificationResult};

use std::sync::Arc;

use adapters::{
    build_http_client, HttpImageFetcher, HttpLabelDetector, SerpApiReverseSearch, SightengineScorer,
};
use authenticity::AuthenticityChecker;
use config::Config;
use reuse::ReuseChecker;

/// Wires the HTTP adapters described by `config` into an engine.
pub fn engine_from_config(config: &Config) -> anyhow::Result<VerificationEngine> {
    let client = build_http_client(config.connect_timeout, config.request_timeout)?;

    let fetcher = HttpImageFetcher::new(client.clone(), config.max_image_bytes);
    let labeler = HttpLabelDetector::new(
        client.clone(),
        config.labeling_endpoint.clone(),
        config.labeling_api_key.clone(),
    );
    let scorer = SightengineScorer::new(
        client.clone(),
        config.sightengine_endpoint.clone(),
        config.sightengine_user.clone(),
        config.sightengine_secret.clone(),
    );
    let search = SerpApiReverseSearch::new(
        client,
        config.serpapi_endpoint.clone(),
        config.serpapi_key.clone(),
    );

    let mut engine = VerificationEngine::new(
        Arc::new(fetcher),
        Arc::new(labeler),
        AuthenticityChecker::new(Arc::new(scorer)),
        ReuseChecker::new(Arc::new(search), config.reuse_policy()),
    );
    if let Some(path) = &config.keywords_file {
        engine = engine.with_keywords(KeywordTable::from_json_file(path)?);
    }
    Ok(engine)
}
