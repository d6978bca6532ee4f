use serde::{Deserialize, Serialize};

use crate::types::HALF_DURATION_SECS;

/// Monotonic match clock counting whole seconds.
///
/// The clock never reads wall time itself; a driver calls [`tick`]
/// once per real second while the clock is running, so wall-clock
/// adjustments cannot move it backwards.
///
/// [`tick`]: MatchClock::tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchClock {
    elapsed_seconds: u32,
    running: bool,
}

impl MatchClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a clock from suspended state. A resumed clock always
    /// starts paused.
    pub fn resume_at(elapsed_seconds: u32) -> Self {
        Self {
            elapsed_seconds,
            running: false,
        }
    }

    /// Start the clock. No-op if already running.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Pause the clock. No-op if already paused.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stop the clock and clear elapsed time.
    pub fn reset(&mut self) {
        self.elapsed_seconds = 0;
        self.running = false;
    }

    /// Advance one second. Does nothing while paused.
    pub fn tick(&mut self) {
        if self.running {
            self.elapsed_seconds += 1;
        }
    }

    /// Advance several seconds at once (driver catch-up, tests).
    pub fn advance(&mut self, seconds: u32) {
        if self.running {
            self.elapsed_seconds += seconds;
        }
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 1 during the first 25 minutes, 2 after.
    pub fn current_half(&self) -> u8 {
        if self.elapsed_seconds < HALF_DURATION_SECS {
            1
        } else {
            2
        }
    }
}

/// Format a second count as zero-padded "MM:SS".
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
