use instant::Instant;

/// Which part of the tick is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Update = 0,
    Render = 1,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Self::Update, Self::Render];

    pub fn label(self) -> &'static str {
        match self {
            Self::Update => "Update",
            Self::Render => "Render",
        }
    }
}

const EMA_ALPHA: f64 = 0.1;

/// Per-phase timing with exponential moving average smoothing.
pub struct PhaseTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; 2],
    start: Instant,
}

impl PhaseTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; 2],
            start: Instant::now(),
        }
    }

    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    pub fn end(&mut self, phase: Phase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        self.record(phase, elapsed_us);
    }

    fn record(&mut self, phase: Phase, elapsed_us: f64) {
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }
}
