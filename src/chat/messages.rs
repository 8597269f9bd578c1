use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said what in the session transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the session's chat history. Append-only, in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What the player knows about the current audiobook, passed alongside each
/// chat request. Field names match the browser's JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiobookContext {
    pub file_name: String,
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,

    /// Most recent transcript text around the playback position.
    #[serde(default)]
    pub context: Option<String>,
}
