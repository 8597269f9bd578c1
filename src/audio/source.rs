use std::path::PathBuf;
use std::sync::Arc;

/// The currently selected audiobook: raw bytes plus everything the player
/// and the extraction pipeline need to know about them.
///
/// Owned by the session and replaced wholesale on a new upload. The stored
/// file backing `file_url` is removed when the source is replaced.
#[derive(Debug, Clone)]
pub struct AudioSource {
    /// Raw file bytes, shared with in-flight extraction requests.
    pub bytes: Arc<Vec<u8>>,

    /// MIME type as reported by the upload (e.g. "audio/mpeg").
    pub mime_type: String,

    /// Original file name, shown to the user and sent as chat context.
    pub display_name: String,

    /// URL path the browser can stream the file from (under /uploads).
    pub file_url: String,

    /// On-disk location of the stored copy.
    pub stored_path: PathBuf,

    /// Total duration in seconds, probed at load time.
    pub duration_seconds: f64,
}

impl AudioSource {
    /// A source that only exists for the duration of one request (the
    /// stateless transcribe endpoint); nothing is stored or served.
    pub fn ephemeral(bytes: Vec<u8>, mime_type: String, display_name: String) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime_type,
            display_name,
            file_url: String::new(),
            stored_path: PathBuf::new(),
            duration_seconds: 0.0,
        }
    }

    /// File extension used to hint the decoder, derived from the display
    /// name ("book.mp3" -> "mp3").
    pub fn extension(&self) -> Option<&str> {
        self.display_name.rsplit_once('.').map(|(_, ext)| ext)
    }
}
