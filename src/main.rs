use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use trash2cash_core::{api, config::Config, engine_from_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ----------------------------------------------------------------
    // 0. Configuration
    // ----------------------------------------------------------------
    let config = Config::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        labeling = %config.labeling_endpoint,
        own_storage = ?config.own_storage_domain,
        keywords = ?config.keywords_file,
        "configuration loaded"
    );
    if config.sightengine_user.is_empty() || config.serpapi_key.is_empty() {
        tracing::warn!(
            "scoring or search credentials missing, those checks will degrade to defaults"
        );
    }

    // ----------------------------------------------------------------
    // 1. Engine (clients are shared by every request)
    // ----------------------------------------------------------------
    let engine = engine_from_config(&config)?;
    let shared_state = Arc::new(api::AppState {
        engine: Arc::new(engine),
        verify_timeout: config.verify_timeout,
    });

    // ----------------------------------------------------------------
    // 2. HTTP
    // ----------------------------------------------------------------
    let app = api::app(shared_state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("listening on http://{}", addr);
    tracing::info!("  POST /verify  : verify a listing photo");
    tracing::info!("  GET  /health  : liveness");

    axum::serve(listener, app).await?;

    Ok(())
}
