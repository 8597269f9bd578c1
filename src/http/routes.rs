use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Upload + transcription
        .route("/api/upload", post(handlers::upload_audiobook))
        .route("/api/transcribe", post(handlers::transcribe_segment))
        // Chat
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/history", get(handlers::chat_history))
        // Player control
        .route("/api/player/play", post(handlers::player_play))
        .route("/api/player/pause", post(handlers::player_pause))
        .route("/api/player/seek", post(handlers::player_seek))
        .route("/api/player/volume", post(handlers::player_volume))
        .route("/api/player/status", get(handlers::player_status))
        // Stored audiobooks, streamed by the browser's audio element
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        // Audio uploads are large; the default 2MB body cap is far too small
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        // Request logging + permissive CORS for the browser front end
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
