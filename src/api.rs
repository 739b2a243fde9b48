use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use crate::{
    category::{Category, UnknownCategory},
    engine::VerificationEngine,
    error::VerifyError,
    evidence::{VerificationRequest, VerificationResult},
};

pub const REJECTION_MESSAGE: &str = "The uploaded image could not be verified as a real photo \
of the declared material. Please upload a real photo of your waste.";

// ==========================================
// 1. Shared state
// ==========================================
// The engine holds only shared clients and immutable tables, so no lock.
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    pub verify_timeout: Duration,
}

// ==========================================
// 2. DTOs
// ==========================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBody {
    pub image_url: String,
    // parsed by hand so an unknown category is a 400 with a clear message
    pub declared_category: String,
}

#[derive(Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(flatten)]
    pub result: VerificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        let status = match &e {
            VerifyError::InvalidLocator { .. } => StatusCode::BAD_REQUEST,
            VerifyError::ImageUnavailable { .. }
            | VerifyError::ImageTooLarge { .. }
            | VerifyError::ImageUndecodable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            VerifyError::LabelDetection(_) => StatusCode::BAD_GATEWAY,
            VerifyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, e.to_string())
    }
}

// ==========================================
// 3. Router
// ==========================================
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/verify", post(verify))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ==========================================
// 4. Handlers
// ==========================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Verifies a listing photo against its declared category.
async fn verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let declared: Category = body
        .declared_category
        .parse()
        .map_err(|e: UnknownCategory| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let request = VerificationRequest {
        image_url: body.image_url,
        declared_category: declared,
    };

    tracing::info!(image_url = %request.image_url, %declared, "verification requested");

    // dropping the verify future on timeout aborts its in-flight checks
    let result = tokio::time::timeout(state.verify_timeout, state.engine.verify_request(&request))
        .await
        .map_err(|_| {
            tracing::warn!(image_url = %request.image_url, "verification timed out");
            api_error(StatusCode::GATEWAY_TIMEOUT, "verification timed out")
        })??;

    let message = (!result.verified).then(|| REJECTION_MESSAGE.to_string());
    Ok(Json(VerifyResponse { result, message }))
}
