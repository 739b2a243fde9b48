use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use trash2cash_core::{api, config::Config, engine_from_config};

/// Behaviour of the fake external services for one test.
#[derive(Clone)]
struct Stub {
    labels: Vec<(&'static str, f64)>,
    ai_score: Option<f64>,
    score_delay: Duration,
    links: Vec<&'static str>,
}

impl Default for Stub {
    fn default() -> Self {
        Self {
            labels: vec![("Plastic Bottle", 92.0), ("Bottle", 88.0)],
            ai_score: Some(0.1),
            score_delay: Duration::ZERO,
            links: vec![],
        }
    }
}

fn png_bytes() -> Vec<u8> {
    let buf = ImageBuffer::from_fn(24, 24, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 90u8]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(buf)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    out
}

async fn image(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "bottle.png" => ([("content-type", "image/png")], png_bytes()).into_response(),
        "page.html" => ([("content-type", "text/html")], "<html>hi</html>").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn labels(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["MaxLabels"], 5);
    assert_eq!(body["MinConfidence"], 70.0);
    assert!(body["Image"]["Bytes"].as_str().is_some());
    let labels: Vec<Value> = stub
        .labels
        .iter()
        .map(|(name, confidence)| json!({"Name": name, "Confidence": confidence}))
        .collect();
    Json(json!({ "Labels": labels }))
}

async fn check(
    State(stub): State<Arc<Stub>>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    assert_eq!(q.get("models").map(String::as_str), Some("genai"));
    tokio::time::sleep(stub.score_delay).await;
    match stub.ai_score {
        Some(score) => {
            Json(json!({"status": "success", "type": {"ai_generated": score}})).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "scoring unavailable").into_response(),
    }
}

async fn search(
    State(stub): State<Arc<Stub>>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    assert_eq!(q.get("engine").map(String::as_str), Some("google_reverse_image"));
    let results: Vec<Value> = stub.links.iter().map(|l| json!({"link": l})).collect();
    Json(json!({ "image_results": results }))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Starts the fake services plus the verification API; returns
/// (api base, fake services base).
async fn start(stub: Stub, extra_env: &[(&str, &str)]) -> (String, String) {
    let upstream = Router::new()
        .route("/images/{name}", get(image))
        .route("/labels", post(labels))
        .route("/check.json", get(check))
        .route("/search", get(search))
        .with_state(Arc::new(stub));
    let upstream_base = serve(upstream).await;

    let mut env: HashMap<String, String> = HashMap::from([
        ("LABELING_ENDPOINT".to_string(), format!("{}/labels", upstream_base)),
        ("SIGHTENGINE_ENDPOINT".to_string(), format!("{}/check.json", upstream_base)),
        ("SIGHTENGINE_USER".to_string(), "user".to_string()),
        ("SIGHTENGINE_SECRET".to_string(), "secret".to_string()),
        ("SERPAPI_ENDPOINT".to_string(), format!("{}/search", upstream_base)),
        ("SERPAPI_KEY".to_string(), "key".to_string()),
        ("REQUEST_TIMEOUT_SECS".to_string(), "2".to_string()),
    ]);
    for (k, v) in extra_env {
        env.insert(k.to_string(), v.to_string());
    }

    let config = Config::from_lookup(|k| env.get(k).cloned()).unwrap();
    let state = Arc::new(api::AppState {
        engine: Arc::new(engine_from_config(&config).unwrap()),
        verify_timeout: config.verify_timeout,
    });
    let api_base = serve(api::app(state)).await;
    (api_base, upstream_base)
}

async fn verify(api_base: &str, image_url: &str, declared: &str) -> (StatusCode, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/verify", api_base))
        .json(&json!({"imageUrl": image_url, "declaredCategory": declared}))
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let (api_base, _) = start(Stub::default(), &[]).await;
    let resp = reqwest::get(format!("{}/health", api_base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_authentic_plastic_bottle_is_verified() {
    let (api_base, upstream) = start(Stub::default(), &[]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "plastic").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);
    assert_eq!(body["detectedCategory"], "PLASTIC");
    assert_eq!(body["confidenceScore"], 92.0);
    assert_eq!(body["isAuthenticImage"], true);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_declared_metal_for_bottle_is_rejected() {
    let (api_base, upstream) = start(Stub::default(), &[]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "METAL").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], false);
    assert_eq!(body["detectedCategory"], "PLASTIC");
    assert_eq!(body["message"], api::REJECTION_MESSAGE);
}

#[tokio::test]
async fn test_stock_photo_is_flagged_but_still_verified() {
    let stub = Stub {
        links: vec!["https://example.org/blog", "https://www.istockphoto.com/photo/bottles-1"],
        ..Stub::default()
    };
    let (api_base, upstream) = start(stub, &[]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (_, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(body["isAuthenticImage"], false);
    assert_eq!(body["verified"], true);
}

#[tokio::test]
async fn test_own_storage_ignores_stock_matches() {
    let stub = Stub {
        links: vec!["https://www.pexels.com/photo/1"],
        ..Stub::default()
    };
    let (api_base, upstream) = start(stub, &[("OWN_STORAGE_DOMAIN", "127.0.0.1")]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (_, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(body["isAuthenticImage"], true);
}

#[tokio::test]
async fn test_scoring_outage_means_not_authentic() {
    let stub = Stub {
        ai_score: None,
        ..Stub::default()
    };
    let (api_base, upstream) = start(stub, &[]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isAuthenticImage"], false);
    assert_eq!(body["verified"], true);
}

#[tokio::test]
async fn test_slow_scoring_times_out_to_not_authentic() {
    let stub = Stub {
        score_delay: Duration::from_secs(5),
        ..Stub::default()
    };
    let (api_base, upstream) = start(stub, &[("REQUEST_TIMEOUT_SECS", "1")]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isAuthenticImage"], false);
}

#[tokio::test]
async fn test_verification_past_deadline_is_gateway_timeout() {
    let stub = Stub {
        score_delay: Duration::from_secs(3),
        ..Stub::default()
    };
    let (api_base, upstream) = start(
        stub,
        &[("VERIFY_TIMEOUT_SECS", "1"), ("REQUEST_TIMEOUT_SECS", "5")],
    )
    .await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "verification timed out");
}

#[tokio::test]
async fn test_low_confidence_labels_give_unknown() {
    let stub = Stub {
        labels: vec![("Bottle", 65.0)],
        ..Stub::default()
    };
    let (api_base, upstream) = start(stub, &[]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "verified": false,
            "detectedCategory": "UNKNOWN",
            "confidenceScore": 0.0,
            "isAuthenticImage": false,
            "message": api::REJECTION_MESSAGE
        })
    );
}

#[tokio::test]
async fn test_missing_image_is_unprocessable() {
    let (api_base, upstream) = start(Stub::default(), &[]).await;
    let image_url = format!("{}/images/gone.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_non_image_body_is_unprocessable() {
    let (api_base, upstream) = start(Stub::default(), &[]).await;
    let image_url = format!("{}/images/page.html", upstream);
    let (status, _) = verify(&api_base, &image_url, "PLASTIC").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_oversized_image_is_unprocessable() {
    let (api_base, upstream) = start(Stub::default(), &[("MAX_IMAGE_BYTES", "16")]).await;
    let image_url = format!("{}/images/bottle.png", upstream);
    let (status, body) = verify(&api_base, &image_url, "PLASTIC").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("exceeds"));
}

#[tokio::test]
async fn test_bad_locator_and_category_are_bad_requests() {
    let (api_base, upstream) = start(Stub::default(), &[]).await;

    let (status, _) = verify(&api_base, "ftp://example.org/a.png", "PLASTIC").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let image_url = format!("{}/images/bottle.png", upstream);

    let (status, body) = verify(&api_base, &image_url, "paper").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("paper"));
}
