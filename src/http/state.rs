use crate::session::AudiobookSession;
use crate::transcribe::Transcriber;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single listening session this process hosts
    pub session: Arc<AudiobookSession>,

    /// Speech-to-text client used by the stateless transcribe endpoint
    pub transcriber: Arc<dyn Transcriber>,

    /// Directory uploaded audiobooks are stored in and served from
    pub uploads_dir: PathBuf,

    /// Request body cap for uploads, in bytes
    pub max_upload_bytes: usize,
}
