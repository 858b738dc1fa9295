/// Rolling window of frame times (seconds), oldest first.
pub struct FrameHistory {
    times: Vec<f64>,
    head: usize,
    capacity: usize,
}

/// Summary of the frame times currently in the window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimeStats {
    pub fps: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            times: Vec::with_capacity(capacity),
            head: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, dt: f64) {
        if self.times.len() < self.capacity {
            self.times.push(dt);
        } else {
            self.times[self.head] = dt;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.times.split_at(self.head);
        older.iter().chain(newer).copied()
    }

    pub fn stats(&self) -> FrameTimeStats {
        if self.times.is_empty() {
            return FrameTimeStats::default();
        }
        let sum: f64 = self.times.iter().sum();
        let avg = sum / self.times.len() as f64;
        FrameTimeStats {
            fps: if avg > 0.0 { 1.0 / avg } else { 0.0 },
            avg,
            min: self.times.iter().copied().fold(f64::MAX, f64::min),
            max: self.times.iter().copied().fold(0.0, f64::max),
        }
    }
}

/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;

/// Accumulates frame times and logs a summary every few seconds.
pub struct FpsLog {
    frame_count: u64,
    timer: f64,
    frames: u32,
    sum: f64,
    min: f64,
    max: f64,
}

impl FpsLog {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            timer: 0.0,
            frames: 0,
            sum: 0.0,
            min: f64::MAX,
            max: 0.0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns true when a summary line was emitted.
    pub fn record(&mut self, dt: f64) -> bool {
        self.frame_count += 1;
        self.frames += 1;
        self.sum += dt;
        self.min = self.min.min(dt);
        self.max = self.max.max(dt);
        self.timer += dt;

        if self.timer < FPS_LOG_INTERVAL {
            return false;
        }
        let avg_ms = (self.sum / self.frames as f64) * 1000.0;
        let fps = self.frames as f64 / self.timer;
        log::info!(
            "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
            fps,
            avg_ms,
            self.min * 1000.0,
            self.max * 1000.0,
            self.frame_count,
        );
        self.timer = 0.0;
        self.frames = 0;
        self.sum = 0.0;
        self.min = f64::MAX;
        self.max = 0.0;
        true
    }
}
