//! Mock transcriber for scheduler and HTTP tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::Transcriber;
use crate::audio::AudioSource;
use crate::session::ContextWindow;

/// Records every request it receives and tracks how many run concurrently.
pub struct MockTranscriber {
    response: String,
    latency: Duration,
    should_fail: bool,
    windows: Mutex<Vec<ContextWindow>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            response: "mock transcript".to_string(),
            latency: Duration::ZERO,
            should_fail: false,
            windows: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Configure the mock to return a specific transcript.
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Simulate upstream latency; requests hold their in-flight slot for
    /// this long.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Configure the mock to fail every request.
    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Windows of every request that reached the transcriber, in order.
    pub fn windows(&self) -> Vec<ContextWindow> {
        self.windows.lock().expect("mock lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.windows.lock().expect("mock lock poisoned").len()
    }

    /// Highest number of requests that were ever in flight at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _source: &AudioSource, window: ContextWindow) -> Result<String> {
        self.windows.lock().expect("mock lock poisoned").push(window);

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail {
            Err(anyhow!("mock transcription failure"))
        } else {
            Ok(self.response.clone())
        }
    }
}
