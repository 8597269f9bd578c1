//! Playback controller.
//!
//! The service does not drive an audio device; the browser's audio element
//! does. What the scheduler and the chat context need is an authoritative
//! clock over the loaded file: position advances in real time while playing,
//! clamps to the duration, and responds to play/pause/seek/volume intents
//! forwarded by the presentation layer.
//!
//! State changes are published on a watch channel so the session can arm and
//! disarm the context scheduler on play/pause transitions.

use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;

/// Snapshot of the playback clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub is_playing: bool,
    pub volume: f32,
}

impl PlaybackState {
    fn stopped() -> Self {
        Self {
            position_seconds: 0.0,
            duration_seconds: 0.0,
            is_playing: false,
            volume: 1.0,
        }
    }
}

struct Clock {
    /// Position at the last state change.
    base_seconds: f64,
    /// Set while playing; elapsed time since then is added to the base.
    resumed_at: Option<Instant>,
    duration_seconds: f64,
    volume: f32,
}

impl Clock {
    fn position(&self, now: Instant) -> f64 {
        let raw = match self.resumed_at {
            Some(resumed_at) => self.base_seconds + (now - resumed_at).as_secs_f64(),
            None => self.base_seconds,
        };
        raw.clamp(0.0, self.duration_seconds)
    }

    fn snapshot(&self, now: Instant) -> PlaybackState {
        PlaybackState {
            position_seconds: self.position(now),
            duration_seconds: self.duration_seconds,
            is_playing: self.resumed_at.is_some(),
            volume: self.volume,
        }
    }
}

pub struct PlaybackController {
    clock: RwLock<Clock>,
    changes: watch::Sender<PlaybackState>,
}

impl PlaybackController {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(PlaybackState::stopped());
        Self {
            clock: RwLock::new(Clock {
                base_seconds: 0.0,
                resumed_at: None,
                duration_seconds: 0.0,
                volume: 1.0,
            }),
            changes,
        }
    }

    /// Receiver for state-change notifications. Every mutation publishes a
    /// fresh snapshot; position drift while playing does not.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.changes.subscribe()
    }

    /// Load a new file: reset to position zero, paused. Volume carries over.
    pub async fn load(&self, duration_seconds: f64) {
        let mut clock = self.clock.write().await;
        clock.base_seconds = 0.0;
        clock.resumed_at = None;
        clock.duration_seconds = duration_seconds.max(0.0);
        self.publish(&clock);
    }

    pub async fn play(&self) {
        let mut clock = self.clock.write().await;
        if clock.resumed_at.is_none() {
            clock.resumed_at = Some(Instant::now());
            self.publish(&clock);
        }
    }

    pub async fn pause(&self) {
        let mut clock = self.clock.write().await;
        if let Some(resumed_at) = clock.resumed_at.take() {
            clock.base_seconds = (clock.base_seconds
                + (Instant::now() - resumed_at).as_secs_f64())
            .clamp(0.0, clock.duration_seconds);
            self.publish(&clock);
        }
    }

    pub async fn seek(&self, position_seconds: f64) {
        let mut clock = self.clock.write().await;
        clock.base_seconds = position_seconds.clamp(0.0, clock.duration_seconds);
        if clock.resumed_at.is_some() {
            clock.resumed_at = Some(Instant::now());
        }
        self.publish(&clock);
    }

    pub async fn set_volume(&self, volume: f32) {
        let mut clock = self.clock.write().await;
        clock.volume = volume.clamp(0.0, 1.0);
        self.publish(&clock);
    }

    pub async fn state(&self) -> PlaybackState {
        self.clock.read().await.snapshot(Instant::now())
    }

    pub async fn position_seconds(&self) -> f64 {
        self.clock.read().await.position(Instant::now())
    }

    pub async fn duration_seconds(&self) -> f64 {
        self.clock.read().await.duration_seconds
    }

    pub async fn is_playing(&self) -> bool {
        self.clock.read().await.resumed_at.is_some()
    }

    fn publish(&self, clock: &Clock) {
        // Nobody listening is fine; the receiver count can drop to zero
        // between session teardown and process exit.
        let _ = self.changes.send(clock.snapshot(Instant::now()));
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}
