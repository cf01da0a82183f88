//! Metrics exporter endpoint.
//!
//! Serves the current registry state over HTTP for pull-based scraping.
//! Scrapes read a point-in-time snapshot and never block or reset the
//! probes' instruments.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tracing::{error, info};

use crate::error::{MonitorError, Result};
use crate::metrics::Metrics;

/// Content type of the Prometheus text exposition format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Build the exporter router.
pub fn create_app(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .route("/healthz", get(healthz))
        .with_state(metrics)
}

async fn serve_metrics(State(metrics): State<Arc<Metrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn healthz() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Start the exporter and serve until the shutdown channel fires.
pub async fn start_web_server(
    listen: &str,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listen
        .parse::<SocketAddr>()
        .map_err(|e| MonitorError::config_error(format!("invalid listen address: {}", e)))?;

    let app = create_app(metrics);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("failed to bind {}: {}", addr, e)))?;

    info!("serving metrics at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
        .map_err(|e| MonitorError::web_server_error(format!("server error: {}", e)))?;

    Ok(())
}
