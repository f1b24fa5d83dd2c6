use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use quack_models::DecisionResponse;
use serde_json::{json, Value};
use tracing::info;

use crate::service::{respond, DecisionError, DecisionService};

pub fn router(service: Arc<DecisionService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/decision", post(decision))
        .with_state(service)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn decision(
    State(service): State<Arc<DecisionService>>,
    body: String,
) -> (StatusCode, Json<DecisionResponse>) {
    let result = service.evaluate_json(&body).await;
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(DecisionError::InvalidJson(_)) | Err(DecisionError::Validation(_)) => {
            StatusCode::BAD_REQUEST
        }
        Err(DecisionError::Execution(e)) => {
            tracing::error!(error = %e, "Error processing decision");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(respond(result)))
}

/// Serve the router until Ctrl-C.
pub async fn serve(service: Arc<DecisionService>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "Decision server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await
        .context("Server error")?;

    Ok(())
}
