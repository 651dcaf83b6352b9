//! HTTP API server.
//!
//! Mirrors the original web surface: `GET`/`POST /api/notes`,
//! `DELETE /api/notes/{filename}`, and `GET /api/health`. Upstream GitHub
//! failures are mirrored to the client with their status and body; a
//! missing notes directory is a `200` with an empty listing, decided in
//! the service layer.

use crate::github::RemoteStore;
use crate::services::NotesService;
use crate::{Error, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Default page size when the query omits `limit`.
const DEFAULT_LIMIT: usize = 10;

/// Shared handler state.
pub struct AppState<S> {
    service: Arc<NotesService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

/// Builds the API router.
#[must_use]
pub fn router<S: RemoteStore>(service: Arc<NotesService<S>>) -> Router {
    Router::new()
        .route("/api/notes", get(list_notes::<S>).post(create_note::<S>))
        .route("/api/notes/{filename}", axum::routing::delete(delete_note::<S>))
        .route("/api/health", get(health::<S>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

/// Binds the listener and serves the API until shutdown.
pub async fn run<S: RemoteStore>(service: Arc<NotesService<S>>, port: u16) -> Result<()> {
    let app = router(service);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "starting gitnotes server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Network(format!("bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Network(format!("serve: {e}")))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u32>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CreateBody {
    content: String,
}

#[derive(Serialize)]
struct CreateResponse {
    success: bool,
    note: crate::models::Note,
}

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    #[serde(rename = "cacheSize")]
    cache_size: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            Self::InvalidName(name) => (
                StatusCode::BAD_REQUEST,
                format!("invalid note filename: {name}"),
                None,
            ),
            Self::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, self.to_string(), None),
            Self::NotFound(path) => (StatusCode::NOT_FOUND, format!("not found: {path}"), None),
            Self::Remote { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "remote error".to_string(),
                Some(message.clone()),
            ),
            Self::Network(msg) => (StatusCode::BAD_GATEWAY, msg.clone(), None),
            Self::Codec(err) => (StatusCode::BAD_GATEWAY, err.to_string(), None),
        };
        tracing::warn!(%status, error, "request failed");
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

async fn list_notes<S: RemoteStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Response {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    match state.service.list(page, limit).await {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_note<S: RemoteStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<CreateBody>,
) -> Response {
    match state.service.create(&body.content).await {
        Ok(note) => Json(CreateResponse {
            success: true,
            note,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_note<S: RemoteStore>(
    State(state): State<AppState<S>>,
    Path(filename): Path<String>,
) -> Response {
    match state.service.delete(&filename).await {
        Ok(()) => Json(DeleteResponse { success: true }).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn health<S: RemoteStore>(State(state): State<AppState<S>>) -> Response {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        cache_size: state.service.cache_len(),
    })
    .into_response()
}
