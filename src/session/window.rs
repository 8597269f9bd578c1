use serde::{Deserialize, Serialize};

/// Half-open time range of audio selected for transcription, in seconds.
///
/// Always a subrange of `[0, duration]` of the loaded file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl ContextWindow {
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    /// The window requested immediately when playback starts, so the
    /// assistant has context before the first periodic tick.
    ///
    /// Anchored at zero even when playback starts mid-file; see the module
    /// tests for why that asymmetry is kept.
    pub fn initial(position: f64, window_seconds: f64) -> Self {
        let half = window_seconds / 2.0;
        Self::new(0.0, half.min(position + half))
    }

    /// The periodic window centered on the playback position, shifted back
    /// when it would run past the end of the file.
    pub fn periodic(position: f64, duration: f64, window_seconds: f64) -> Self {
        let half = window_seconds / 2.0;
        let mut start = position - half;
        let mut end = position + half;
        if end > duration {
            end = duration;
            start = end - window_seconds;
        }
        Self::new(start.max(0.0), end.clamp(0.0, duration))
    }

    /// The window covering the tail of the file, requested once when less
    /// than half a window of playback remains.
    pub fn tail(duration: f64, window_seconds: f64) -> Self {
        let half = window_seconds / 2.0;
        Self::new((duration - half).max(0.0), duration)
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end_seconds - self.start_seconds).max(0.0)
    }
}
