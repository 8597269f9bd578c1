pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod playback;
pub mod session;
pub mod transcribe;

pub use audio::AudioSource;
pub use chat::{AudiobookContext, ChatBackend, ChatClient, ChatMessage, MockChatBackend, Role};
pub use config::Config;
pub use error::ApiError;
pub use http::{create_router, AppState};
pub use playback::{PlaybackController, PlaybackState};
pub use session::{
    AudiobookSession, ContextScheduler, ContextWindow, SchedulerConfig, SessionStatus,
};
pub use transcribe::{MockTranscriber, TranscriptClient, Transcriber};
