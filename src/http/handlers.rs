use super::state::AppState;
use crate::audio::{decode, AudioSource};
use crate::chat::{AudiobookContext, ChatMessage};
use crate::error::ApiError;
use crate::session::{ContextWindow, SessionStatus};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,

    /// The player's view of the loaded audiobook, or null when nothing is
    /// playing.
    pub audiobook_context: Option<AudiobookContext>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_url: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    pub volume: f32,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/upload
/// Store an uploaded audiobook and load it into the session
pub async fn upload_audiobook(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or("audiobook")
            .to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Upload(format!("Failed to read upload: {e}")))?;

        upload = Some((filename, mime_type, bytes.to_vec()));
    }

    let Some((filename, mime_type, bytes)) = upload else {
        return Err(ApiError::Upload("No file uploaded".to_string()));
    };

    if !mime_type.starts_with("audio/") {
        return Err(ApiError::Upload(format!(
            "Expected an audio file, got {mime_type}"
        )));
    }

    // Unique stored name, keeping the extension for the decoder and the
    // browser.
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin");
    let stored_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
    let stored_path = state.uploads_dir.join(&stored_name);

    let bytes = Arc::new(bytes);

    let probe_bytes = Arc::clone(&bytes);
    let probe_ext = extension.to_string();
    let duration_seconds = tokio::task::spawn_blocking(move || {
        decode::probe_duration(probe_bytes, Some(&probe_ext))
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Probe task panicked: {e}")))?
    .map_err(|e| ApiError::Upload(format!("Could not decode audio file: {e:#}")))?;

    tokio::fs::write(&stored_path, bytes.as_slice())
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to store upload: {e}")))?;

    info!(
        "Stored upload {} as {} ({:.1}s)",
        filename, stored_name, duration_seconds
    );

    let file_url = format!("/uploads/{stored_name}");
    state
        .session
        .load(AudioSource {
            bytes,
            mime_type,
            display_name: filename.clone(),
            file_url: file_url.clone(),
            stored_path,
            duration_seconds,
        })
        .await;

    Ok(Json(UploadResponse {
        file_url,
        filename,
    }))
}

/// POST /api/transcribe
/// Transcribe a time window of an uploaded audio segment. Stateless: the
/// audio travels with the request.
pub async fn transcribe_segment(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<(String, String, Vec<u8>)> = None;
    let mut start_time: Option<f64> = None;
    let mut end_time: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("audio") => {
                let filename = field.file_name().unwrap_or("audio").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Upload(format!("Failed to read audio: {e}")))?;
                audio = Some((filename, mime_type, bytes.to_vec()));
            }
            Some("startTime") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Upload(format!("Failed to read startTime: {e}")))?;
                start_time = Some(text.parse().map_err(|_| {
                    ApiError::Upload(format!("Invalid startTime: {text}"))
                })?);
            }
            Some("endTime") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Upload(format!("Failed to read endTime: {e}")))?;
                end_time = Some(text.parse().map_err(|_| {
                    ApiError::Upload(format!("Invalid endTime: {text}"))
                })?);
            }
            _ => {}
        }
    }

    let Some((filename, mime_type, bytes)) = audio else {
        return Err(ApiError::Upload("No audio file provided".to_string()));
    };
    let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
        return Err(ApiError::Upload(
            "Missing startTime or endTime".to_string(),
        ));
    };

    let source = AudioSource::ephemeral(bytes, mime_type, filename);
    let window = ContextWindow::new(start_time, end_time);

    let text = state
        .transcriber
        .transcribe(&source, window)
        .await
        .map_err(ApiError::Extraction)?;

    Ok(Json(TranscribeResponse { text }))
}

/// POST /api/chat
/// One chat turn: user message in, assistant reply out. Upstream failures
/// come back as the fallback reply, never as an error status.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = state
        .session
        .send_message(req.message, req.audiobook_context)
        .await;

    Json(ChatResponse {
        message: reply.text,
    })
}

/// GET /api/chat/history
/// The session's chat transcript, oldest first
pub async fn chat_history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.session.history().await)
}

/// POST /api/player/play
pub async fn player_play(State(state): State<AppState>) -> Result<Json<SessionStatus>, ApiError> {
    state.session.play().await?;
    Ok(Json(state.session.status().await))
}

/// POST /api/player/pause
pub async fn player_pause(State(state): State<AppState>) -> Json<SessionStatus> {
    state.session.pause().await;
    Json(state.session.status().await)
}

/// POST /api/player/seek
pub async fn player_seek(
    State(state): State<AppState>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<SessionStatus>, ApiError> {
    state.session.seek(req.position).await?;
    Ok(Json(state.session.status().await))
}

/// POST /api/player/volume
pub async fn player_volume(
    State(state): State<AppState>,
    Json(req): Json<VolumeRequest>,
) -> Json<SessionStatus> {
    state.session.set_volume(req.volume).await;
    Json(state.session.status().await)
}

/// GET /api/player/status
pub async fn player_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status().await)
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
