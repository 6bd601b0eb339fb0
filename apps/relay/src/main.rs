//! HTTP host for the relay pipeline. Binds a webhook route, hands each
//! request body to the pipeline, and maps the outcome to an HTTP status.
//! All decision logic lives in `blr-core`; this binary only does wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use blr_core::{Pipeline, RelayConfig, RelayError};
use blr_telemetry::{init_telemetry, TelemetryConfig};
use serde_json::json;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env("blr-relay", env!("CARGO_PKG_VERSION"));
    init_telemetry(telemetry)?;

    let config = RelayConfig::from_env()?;
    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let pipeline = Arc::new(Pipeline::from_config(&config, http)?);

    let app = router(AppState { pipeline });

    let addr: std::net::SocketAddr = std::env::var("BIND")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;
    tracing::info!("relay listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(handle_events))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

async fn handle_events(State(state): State<AppState>, body: String) -> impl IntoResponse {
    match state.pipeline.run(&body).await {
        Ok(forwarded) => (
            StatusCode::ACCEPTED,
            Json(json!({ "ok": true, "forwarded": forwarded })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "pipeline invocation failed");
            (status_for(&err), Json(json!({ "ok": false, "error": err.to_string() })))
        }
    }
}

fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::Config(_) | RelayError::Parse(_) => StatusCode::BAD_REQUEST,
        RelayError::BlobAccess { .. } | RelayError::Auth(_) | RelayError::Ingestion(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}
