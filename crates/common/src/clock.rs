//! Clock utilities for analysis runs.
//!
//! Every analysis run is anchored to a monotonic epoch recorded when the
//! run starts, together with the wall-clock time at that moment. Temporal
//! samples are stamped from this clock so that their wall-clock timestamps
//! stay monotonic even if the system clock is adjusted mid-run.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// A run clock that provides monotonic timestamps relative to a fixed
/// epoch (the moment analysis started).
#[derive(Debug, Clone)]
pub struct AnalysisClock {
    /// The instant the run started.
    epoch: Instant,

    /// Wall-clock time at epoch.
    epoch_wall: DateTime<Utc>,
}

impl AnalysisClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: Utc::now(),
        }
    }

    /// Seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at run start.
    pub fn epoch_wall(&self) -> DateTime<Utc> {
        self.epoch_wall
    }

    /// Current wall-clock time derived from the monotonic epoch.
    pub fn now_wall(&self) -> DateTime<Utc> {
        self.wall_at(self.epoch.elapsed())
    }

    /// Current wall-clock time as an RFC 3339 string.
    pub fn now_rfc3339(&self) -> String {
        self.now_wall().to_rfc3339()
    }

    fn wall_at(&self, elapsed: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|d| self.epoch_wall.checked_add_signed(d))
            .unwrap_or(self.epoch_wall)
    }

    /// Convert a frame index into media time at the given frame rate.
    /// Frame indices are 1-based; frame 1 is at 0 seconds.
    pub fn frame_to_secs(frame_index: u64, fps: f64) -> f64 {
        if fps <= 0.0 || frame_index == 0 {
            return 0.0;
        }
        (frame_index - 1) as f64 / fps
    }
}
