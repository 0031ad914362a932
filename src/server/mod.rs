use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::transcribe::{TranscriptPipeline, TranscriptResult};
use crate::{ErrorKind, TranscriptError};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranscriptPipeline>,
}

impl AppState {
    pub fn new(pipeline: TranscriptPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

/// Error half of every handler result; renders as `{"error": .., "kind": ..}`
#[derive(Debug)]
pub struct HttpError(TranscriptError);

impl From<TranscriptError> for HttpError {
    fn from(err: TranscriptError) -> Self {
        Self(err)
    }
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::TranscriptsDisabled
            | ErrorKind::VideoUnavailable
            | ErrorKind::NoSuitableTranscript => StatusCode::NOT_FOUND,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::TransportFailure => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/get-transcript", post(get_transcript))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: AppState, config: &ServerConfig) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, languages = ?state.pipeline.languages(), "transcript service listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("transcript service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_transcript(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<TranscriptResult>, HttpError> {
    let request_id = uuid::Uuid::new_v4();

    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(%request_id, error = %rejection.body_text(), "rejected transcript request body");
        TranscriptError::InvalidInput("Request body must be a JSON object with a url field".to_string())
    })?;

    tracing::info!(%request_id, url = request.url.as_deref().unwrap_or(""), "received transcript request");

    match state.pipeline.transcribe_from_url(request.url.as_deref()).await {
        Ok(result) => {
            tracing::info!(
                %request_id,
                video_id = %result.video_id,
                language = %result.language,
                generated = result.is_generated,
                "transcript request completed"
            );
            Ok(Json(result))
        }
        Err(error) => {
            tracing::warn!(%request_id, kind = %error.kind(), error = %error, "transcript request failed");
            Err(error.into())
        }
    }
}
