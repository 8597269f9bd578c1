use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::Transcriber;
use crate::audio::{segment, AudioSource};
use crate::config::OpenAiConfig;
use crate::session::ContextWindow;

/// Whisper-style transcription client.
///
/// Cuts the window out of the source, writes it to a temp WAV, and posts it
/// as multipart form data. The temp file is removed on every exit path.
pub struct TranscriptClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl TranscriptClient {
    pub fn new(config: &OpenAiConfig, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!(
                "{}/audio/transcriptions",
                config.api_base.trim_end_matches('/')
            ),
            api_key,
            model: config.transcription_model.clone(),
        }
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for TranscriptClient {
    async fn transcribe(&self, source: &AudioSource, window: ContextWindow) -> Result<String> {
        // Decoding is CPU-bound; keep it off the runtime workers.
        let cut_source = source.clone();
        let segment_file = tokio::task::spawn_blocking(move || {
            segment::cut_window(&cut_source, window.start_seconds, window.end_seconds)
        })
        .await
        .context("Segment cutting task panicked")??;

        let Some(segment_file) = segment_file else {
            // Window past the decoded audio; nothing to transcribe.
            return Ok(String::new());
        };

        let wav_bytes = tokio::fs::read(segment_file.path())
            .await
            .context("Failed to read segment WAV")?;

        info!(
            "Sending transcription request for window {:.2}s-{:.2}s ({} bytes)",
            window.start_seconds,
            window.end_seconds,
            wav_bytes.len()
        );

        let part = reqwest::multipart::Part::bytes(wav_bytes)
            .file_name("segment.wav")
            .mime_str("audio/wav")
            .context("Invalid segment MIME type")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?
            .error_for_status()
            .context("Transcription API returned an error status")?;

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        // segment_file dropped here; the temp WAV is removed on success and
        // on every early return above.
        Ok(transcription.text)
    }
}
