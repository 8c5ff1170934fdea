use std::time::{Duration, Instant};

/// Rolling frame-time statistics, fed by `begin`/`end` around each frame.
#[derive(Debug)]
pub struct FrameStats {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
    started: Option<Instant>,
    frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(120)
    }
}

impl FrameStats {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
            started: None,
            frames: 0,
        }
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Close the frame opened by [`begin`](Self::begin). Without a matching
    /// `begin` this does nothing.
    pub fn end(&mut self) {
        if let Some(started) = self.started.take() {
            self.record(started.elapsed());
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
        self.frames += 1;
    }

    fn window(&self) -> &[Duration] {
        let count = if self.filled { self.capacity } else { self.index };
        &self.history[..count]
    }

    pub fn last(&self) -> Duration {
        if self.count() == 0 {
            return Duration::ZERO;
        }
        self.history[(self.index + self.capacity - 1) % self.capacity]
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

    /// Frames per second implied by the average frame time.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        self.window().len()
    }

    /// Frames recorded since creation, not limited to the window.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_in_frame(&self) -> bool {
        self.started.is_some()
    }
}
