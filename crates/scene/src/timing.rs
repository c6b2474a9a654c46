use std::time::Duration;

/// Rolling window of recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    next: usize,
    filled: bool,
}

impl FrameTimer {
    /// Keep the last `capacity` frames. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            next: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.next] = dt;
        self.next = (self.next + 1) % self.history.len();
        if self.next == 0 {
            self.filled = true;
        }
    }

    /// Record a frame given in seconds, as produced by the frame loop.
    pub fn record_secs(&mut self, dt: f32) {
        self.record(Duration::from_secs_f32(dt.max(0.0)));
    }

    fn window(&self) -> &[Duration] {
        if self.filled {
            &self.history
        } else {
            &self.history[..self.next]
        }
    }

    pub fn count(&self) -> usize {
        self.window().len()
    }

    pub fn average(&self) -> Duration {
        let window = self.window();
        if window.is_empty() {
            return Duration::ZERO;
        }
        window.iter().sum::<Duration>() / window.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.window().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    /// Frames per second over the window, 0 when nothing was recorded.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}
