//! Context extraction scheduler.
//!
//! Decides when to transcribe a window of audio around the playback position
//! and serializes those requests so at most one is outstanding.
//!
//! Lifecycle: **Idle** (nothing loaded or paused) and **Armed** (playing);
//! `arm()` and `disarm()` move between them. While armed, three timers run:
//!
//! - an immediate one-shot for the initial window, so the assistant has
//!   context before the first periodic tick;
//! - a periodic tick every window length, transcribing the window centered
//!   on the current position;
//! - a once-per-second end check that schedules exactly one tail-window
//!   extraction, fired after a delay equal to the remaining playback time.
//!
//! Every attempt passes the same guard chain: skip when paused, past the
//! end, busy, or debounced. Disarming aborts the timers and bumps a
//! generation counter; an extraction already on the wire is left to finish
//! and its result is discarded instead of applied.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, info, warn};

use super::window::ContextWindow;
use crate::audio::AudioSource;
use crate::playback::PlaybackController;
use crate::transcribe::Transcriber;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Total context window. Also the periodic tick interval and the
    /// debounce interval, so request volume is bounded to roughly one per
    /// window of playback.
    pub window: Duration,

    /// How often to check whether the tail extraction is due.
    pub end_check_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(30),
            end_check_period: Duration::from_secs(1),
        }
    }
}

/// State shared between the scheduler handle and its timer tasks.
struct SchedulerShared {
    config: SchedulerConfig,
    playback: Arc<PlaybackController>,
    transcriber: Arc<dyn Transcriber>,

    /// The session's media slot; replaced wholesale on upload.
    source: Arc<RwLock<Option<AudioSource>>>,

    /// The session's current context string, overwritten on success.
    context: Arc<RwLock<String>>,

    /// True while an extraction request is outstanding. Released only by the
    /// completion path, so the single-in-flight invariant holds across
    /// disarm and re-arm.
    in_flight: AtomicBool,

    /// When the last request actually started (survives disarm and file
    /// replacement, like the player it replaces).
    last_request_start: Mutex<Option<Instant>>,

    /// Bumped on disarm; completions from an older generation are discarded.
    generation: AtomicU64,

    /// Set once per armed run when the tail extraction has been scheduled.
    tail_scheduled: AtomicBool,

    /// Pending tail-extraction delay, abortable on disarm.
    tail_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SchedulerShared {
    fn window_seconds(&self) -> f64 {
        self.config.window.as_secs_f64()
    }

    /// Run one extraction attempt. All skips are silent no-ops apart from a
    /// debug line; failures leave the context untouched.
    async fn extract(self: Arc<Self>, window: ContextWindow, generation: u64) {
        let state = self.playback.state().await;
        if !state.is_playing || state.position_seconds >= state.duration_seconds {
            debug!("Audio not playing or ended, skipping extraction");
            return;
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Extraction already in flight, skipping");
            return;
        }

        // Debounce: one request per window interval, measured from request
        // start. This suppresses the periodic tick that lands right after
        // the initial call.
        {
            let mut last = self.last_request_start.lock().await;
            let now = Instant::now();
            if let Some(previous) = *last {
                if now - previous < self.config.window {
                    debug!("Request too soon after the previous one, skipping");
                    self.in_flight.store(false, Ordering::SeqCst);
                    return;
                }
            }
            *last = Some(now);
        }

        let source = self.source.read().await.clone();
        let Some(source) = source else {
            self.in_flight.store(false, Ordering::SeqCst);
            return;
        };

        info!(
            "Requesting transcript for window {:.2}s-{:.2}s",
            window.start_seconds, window.end_seconds
        );

        let result = self.transcriber.transcribe(&source, window).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(text) => {
                if text.is_empty() {
                    return;
                }
                if self.generation.load(Ordering::SeqCst) != generation {
                    debug!("Discarding transcript from a torn-down run");
                    return;
                }
                *self.context.write().await = text;
            }
            Err(e) => {
                // No retry; the previous context stays current.
                warn!("Text extraction failed: {:#}", e);
            }
        }
    }
}

#[derive(Default)]
struct TimerHandles {
    periodic: Option<JoinHandle<()>>,
    end_check: Option<JoinHandle<()>>,
}

pub struct ContextScheduler {
    shared: Arc<SchedulerShared>,
    armed: AtomicBool,

    /// Timer tasks for the current armed run. The lock also serializes
    /// arm/disarm so a racing pair cannot leave an orphaned timer behind.
    handles: Mutex<TimerHandles>,
}

impl ContextScheduler {
    pub fn new(
        config: SchedulerConfig,
        playback: Arc<PlaybackController>,
        transcriber: Arc<dyn Transcriber>,
        source: Arc<RwLock<Option<AudioSource>>>,
        context: Arc<RwLock<String>>,
    ) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                config,
                playback,
                transcriber,
                source,
                context,
                in_flight: AtomicBool::new(false),
                last_request_start: Mutex::new(None),
                generation: AtomicU64::new(0),
                tail_scheduled: AtomicBool::new(false),
                tail_handle: Mutex::new(None),
            }),
            armed: AtomicBool::new(false),
            handles: Mutex::new(TimerHandles::default()),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Whether the one-shot tail extraction has been scheduled for the
    /// current armed run.
    pub fn tail_extraction_scheduled(&self) -> bool {
        self.shared.tail_scheduled.load(Ordering::SeqCst)
    }

    /// Enter the Armed state: request initial context now and start the
    /// periodic and end-check timers. Idempotent while armed.
    pub async fn arm(&self) {
        let mut handles = self.handles.lock().await;
        if self.armed.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Arming context scheduler");

        let generation = self.shared.generation.load(Ordering::SeqCst);
        self.shared.tail_scheduled.store(false, Ordering::SeqCst);

        // Initial context, before the first periodic tick. Detached: once a
        // request is on the wire it is never aborted, only ignored.
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let position = shared.playback.position_seconds().await;
            let window = ContextWindow::initial(position, shared.window_seconds());
            Arc::clone(&shared).extract(window, generation).await;
        });

        let shared = Arc::clone(&self.shared);
        let period = self.shared.config.window;
        handles.periodic = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let state = shared.playback.state().await;
                if state.position_seconds >= state.duration_seconds {
                    continue;
                }
                let window = ContextWindow::periodic(
                    state.position_seconds,
                    state.duration_seconds,
                    shared.window_seconds(),
                );
                tokio::spawn(Arc::clone(&shared).extract(window, generation));
            }
        }));

        let shared = Arc::clone(&self.shared);
        let check_period = self.shared.config.end_check_period;
        handles.end_check = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + check_period, check_period);
            loop {
                ticker.tick().await;
                let state = shared.playback.state().await;
                if state.position_seconds >= state.duration_seconds {
                    continue;
                }
                let remaining = state.duration_seconds - state.position_seconds;
                if remaining > shared.window_seconds() / 2.0 {
                    continue;
                }
                if shared.tail_scheduled.swap(true, Ordering::SeqCst) {
                    continue;
                }

                debug!(
                    "Scheduling tail extraction in {:.2}s (position {:.2}s of {:.2}s)",
                    remaining, state.position_seconds, state.duration_seconds
                );

                let tail_shared = Arc::clone(&shared);
                let handle = tokio::spawn(async move {
                    sleep(Duration::from_secs_f64(remaining)).await;
                    let duration = tail_shared.playback.duration_seconds().await;
                    let window =
                        ContextWindow::tail(duration, tail_shared.window_seconds());
                    tokio::spawn(Arc::clone(&tail_shared).extract(window, generation));
                });
                *shared.tail_handle.lock().await = Some(handle);
            }
        }));
    }

    /// Leave the Armed state: stop the timers and cancel any pending tail
    /// delay. An extraction already in flight is marked stale and its result
    /// discarded on completion. Idempotent while idle.
    pub async fn disarm(&self) {
        let mut handles = self.handles.lock().await;
        if !self.armed.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Disarming context scheduler");

        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(handle) = handles.periodic.take() {
            handle.abort();
        }
        if let Some(handle) = handles.end_check.take() {
            handle.abort();
        }
        if let Some(handle) = self.shared.tail_handle.lock().await.take() {
            handle.abort();
        }
    }
}

impl Drop for ContextScheduler {
    fn drop(&mut self) {
        // Timer tasks hold only the shared inner, not the scheduler itself;
        // abort them so a dropped session does not keep ticking.
        if let Ok(mut handles) = self.handles.try_lock() {
            if let Some(handle) = handles.periodic.take() {
                handle.abort();
            }
            if let Some(handle) = handles.end_check.take() {
                handle.abort();
            }
        }
        if let Ok(mut guard) = self.shared.tail_handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
