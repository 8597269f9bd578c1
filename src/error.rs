//! Error taxonomy for the HTTP boundary.
//!
//! Internals use `anyhow` and recover locally where the design calls for
//! graceful degradation (stale context, fallback chat reply). Only failures
//! that must surface to the caller are mapped into `ApiError` here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing file in an upload request.
    #[error("{0}")]
    Upload(String),

    /// Player operation with no audiobook loaded.
    #[error("no audiobook loaded")]
    NoAudiobook,

    /// Segment cut or transcription failure.
    #[error("failed to extract text: {0}")]
    Extraction(#[source] anyhow::Error),

    /// Anything else that escaped the request boundary.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::NoAudiobook => StatusCode::CONFLICT,
            ApiError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {:#}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
