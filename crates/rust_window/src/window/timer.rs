//! Frame timing for window run loops

use std::time::{Duration, Instant};

/// Measures the time between consecutive presented frames of one window
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_frame: Instant,
    delta: Duration,
    total: Duration,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a timer whose first delta is measured from now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            total: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Mark the start of a new frame
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame);
        self.total += self.delta;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Time between the two most recent updates
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Time between the two most recent updates, in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta.as_secs_f64()
    }

    /// Sum of every delta so far
    pub fn total_time(&self) -> Duration {
        self.total
    }

    /// Number of updates so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second based on the last delta
    pub fn current_fps(&self) -> f64 {
        let delta = self.delta_time();
        if delta > 0.0 {
            1.0 / delta
        } else {
            0.0
        }
    }
}
