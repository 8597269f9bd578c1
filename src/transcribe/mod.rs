//! Speech-to-text client.
//!
//! The `Transcriber` trait is the seam between the context scheduler and the
//! transcription service, so timer behavior can be tested against a mock.
//! The production implementation cuts the requested window out of the source
//! audio and ships it to an OpenAI-style transcription endpoint.

mod client;
mod mock;

pub use client::TranscriptClient;
pub use mock::MockTranscriber;

use crate::audio::AudioSource;
use crate::session::ContextWindow;
use anyhow::Result;
use async_trait::async_trait;

/// Trait for windowed speech-to-text transcription.
///
/// Implementations are stateless per call: audio in, text out. Failures are
/// returned to the caller; the scheduler absorbs them (context left
/// unchanged) while the HTTP transcribe endpoint surfaces them.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the given window of the source audio.
    async fn transcribe(&self, source: &AudioSource, window: ContextWindow) -> Result<String>;
}
