use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::scheduler::{ContextScheduler, SchedulerConfig};
use crate::audio::AudioSource;
use crate::chat::{system_prompt, AudiobookContext, ChatBackend, ChatMessage, FALLBACK_REPLY};
use crate::error::ApiError;
use crate::playback::{PlaybackController, PlaybackState};
use crate::transcribe::Transcriber;

/// One listening session: the loaded audiobook, its playback clock, the
/// context scheduler, and the chat transcript.
///
/// The process hosts exactly one session; the HTTP layer holds it in an Arc.
pub struct AudiobookSession {
    playback: Arc<PlaybackController>,
    scheduler: Arc<ContextScheduler>,
    source: Arc<RwLock<Option<AudioSource>>>,
    context: Arc<RwLock<String>>,
    messages: Mutex<Vec<ChatMessage>>,
    chat: Arc<dyn ChatBackend>,
    monitor_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Snapshot of the session for the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub playback: PlaybackState,
    pub context: String,
}

impl AudiobookSession {
    pub fn new(
        chat: Arc<dyn ChatBackend>,
        transcriber: Arc<dyn Transcriber>,
        scheduler_config: SchedulerConfig,
    ) -> Arc<Self> {
        let playback = Arc::new(PlaybackController::new());
        let source: Arc<RwLock<Option<AudioSource>>> = Arc::new(RwLock::new(None));
        let context = Arc::new(RwLock::new(String::new()));

        let scheduler = Arc::new(ContextScheduler::new(
            scheduler_config,
            Arc::clone(&playback),
            transcriber,
            Arc::clone(&source),
            Arc::clone(&context),
        ));

        let session = Arc::new(Self {
            playback,
            scheduler,
            source,
            context,
            messages: Mutex::new(Vec::new()),
            chat,
            monitor_handle: std::sync::Mutex::new(None),
        });

        let handle = session.spawn_playback_monitor();
        if let Ok(mut guard) = session.monitor_handle.lock() {
            *guard = Some(handle);
        }

        session
    }

    /// Watch playback state changes and keep the scheduler lifecycle in
    /// step: armed while playing with a file loaded, idle otherwise.
    fn spawn_playback_monitor(&self) -> JoinHandle<()> {
        let mut changes = self.playback.subscribe();
        let scheduler = Arc::clone(&self.scheduler);
        let source = Arc::clone(&self.source);

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let state = *changes.borrow_and_update();
                let loaded = source.read().await.is_some();
                if state.is_playing && loaded {
                    scheduler.arm().await;
                } else {
                    scheduler.disarm().await;
                }
            }
        })
    }

    /// Replace the loaded audiobook. Tears the scheduler down first so an
    /// in-flight extraction for the old file can never land in the fresh
    /// context, then releases the previous stored file.
    pub async fn load(&self, source: AudioSource) {
        info!(
            "Loading audiobook: {} ({:.1}s)",
            source.display_name, source.duration_seconds
        );

        self.scheduler.disarm().await;

        let previous = {
            let mut slot = self.source.write().await;
            slot.replace(source.clone())
        };
        self.context.write().await.clear();
        self.playback.load(source.duration_seconds).await;

        if let Some(previous) = previous {
            if previous.stored_path != source.stored_path {
                if let Err(e) = tokio::fs::remove_file(&previous.stored_path).await {
                    warn!(
                        "Failed to remove replaced upload {:?}: {}",
                        previous.stored_path, e
                    );
                }
            }
        }
    }

    pub async fn play(&self) -> Result<(), ApiError> {
        if self.source.read().await.is_none() {
            return Err(ApiError::NoAudiobook);
        }
        self.playback.play().await;
        Ok(())
    }

    pub async fn pause(&self) {
        self.playback.pause().await;
    }

    pub async fn seek(&self, position_seconds: f64) -> Result<(), ApiError> {
        if self.source.read().await.is_none() {
            return Err(ApiError::NoAudiobook);
        }
        self.playback.seek(position_seconds).await;
        Ok(())
    }

    pub async fn set_volume(&self, volume: f32) {
        self.playback.set_volume(volume).await;
    }

    /// Append the user's message, ask the chat backend for a reply, and
    /// append that too. Upstream failures become the fixed fallback reply;
    /// the session never surfaces them as errors.
    pub async fn send_message(
        &self,
        text: String,
        context: Option<AudiobookContext>,
    ) -> ChatMessage {
        self.messages.lock().await.push(ChatMessage::user(&*text));

        let prompt = system_prompt(context.as_ref());
        let reply = match self.chat.complete(&prompt, &text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Chat completion failed: {:#}", e);
                FALLBACK_REPLY.to_string()
            }
        };

        let message = ChatMessage::assistant(reply);
        self.messages.lock().await.push(message.clone());
        message
    }

    /// The chat transcript so far, oldest first.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.messages.lock().await.clone()
    }

    /// Most recent transcript text around the playback position.
    pub async fn current_context(&self) -> String {
        self.context.read().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        let source = self.source.read().await;
        SessionStatus {
            file_name: source.as_ref().map(|s| s.display_name.clone()),
            file_url: source.as_ref().map(|s| s.file_url.clone()),
            playback: self.playback.state().await,
            context: self.context.read().await.clone(),
        }
    }

    pub fn scheduler(&self) -> &ContextScheduler {
        &self.scheduler
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }
}

impl Drop for AudiobookSession {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.monitor_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
