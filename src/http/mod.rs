//! HTTP API server for the browser front end
//!
//! This module provides the REST API the player and chat panel talk to:
//! - POST /api/upload - store an audiobook and load it into the session
//! - POST /api/transcribe - transcribe a time window of an uploaded segment
//! - POST /api/chat - send a chat message with optional audiobook context
//! - GET  /api/chat/history - the session's chat transcript
//! - POST /api/player/{play,pause,seek,volume} - playback intents
//! - GET  /api/player/status - playback snapshot plus current context
//! - GET  /health - health check
//! - GET  /uploads/* - stored audiobook files (streamed by the audio element)

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
