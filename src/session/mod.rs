//! Listening session management
//!
//! This module provides the session abstraction that ties the player
//! together:
//! - `AudiobookSession`: loaded source, playback clock, chat transcript
//! - `ContextScheduler`: periodic transcript extraction around the playback
//!   position, with a strict single-in-flight guarantee
//! - `ContextWindow`: the time-range arithmetic the scheduler runs on

mod scheduler;
mod session;
mod window;

pub use scheduler::{ContextScheduler, SchedulerConfig};
pub use session::{AudiobookSession, SessionStatus};
pub use window::ContextWindow;
