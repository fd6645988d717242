//! HTTP surface: `POST /api-endpoint`, plus `/health` and `/metrics`.

use crate::config::RelayConfig;
use crate::error::{ErrorKind, RelayError};
use crate::generator::StaticSiteGenerator;
use crate::notifier::{HttpCallbackClient, Notifier};
use crate::observability::MetricsCollector;
use crate::orchestrator::Orchestrator;
use crate::publisher::GithubPublisher;
use crate::storage::SqliteRecordStore;
use crate::submission::SubmissionRequest;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: MetricsCollector,
}

/// Error response in the shape each failure class promises to the caller.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "status": "error", "message": message.into() }),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err.kind() {
            ErrorKind::Auth => ApiError::forbidden(err.to_string()),
            ErrorKind::Validation => ApiError::bad_request(err.to_string()),
            ErrorKind::Downstream => ApiError::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api-endpoint", post(submit))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The body is parsed by hand so a non-JSON content type is still accepted.
async fn submit(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: SubmissionRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {}", e)))?;

    let ack = state.orchestrator.handle(&request).await?;
    Ok((StatusCode::OK, Json(ack)).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let text = state
        .metrics
        .export()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text).into_response())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Submission handler panicked");
    ApiError::internal(format!("internal error: {}", detail)).into_response()
}

/// Wires the production collaborators from `config`.
pub async fn build_state(config: &RelayConfig) -> crate::error::Result<AppState> {
    let metrics = MetricsCollector::new().map_err(|e| RelayError::Unknown(e.to_string()))?;

    let store = SqliteRecordStore::open(&config.storage.database_path).await?;
    let publisher = GithubPublisher::new(&config.github)?;
    let notifier = Notifier::new(Arc::new(HttpCallbackClient::new()), &config.notifier)
        .with_metrics(metrics.clone());

    let orchestrator = Orchestrator::new(
        config.auth.expected_secret.clone(),
        Arc::new(store),
        Arc::new(StaticSiteGenerator::new()),
        Arc::new(publisher),
        notifier,
    )
    .with_scratch_root(config.workspace.scratch_root.clone())
    .with_background_notify(config.notifier.background)
    .with_metrics(metrics.clone());

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        metrics,
    })
}

/// Binds `config.server.bind` and serves until Ctrl-C.
pub async fn serve(config: &RelayConfig) -> crate::error::Result<()> {
    let state = build_state(config).await?;
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "Relay listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
