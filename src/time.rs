//! Fixed-timestep clock using an accumulator.
//!
//! `draw_web()` runs at the browser's frame rate with a variable delta.
//! GameTime turns that into whole engine frames so timers, ZigZag motion and
//! the auto-clicker advance in deterministic steps.

pub struct GameTime {
    ms_per_tick: f64,
    /// Milliseconds not yet consumed as ticks.
    accumulator: f64,
    /// Timestamp of the last update (ms), None before the first frame.
    last_timestamp: Option<f64>,
}

impl GameTime {
    /// Longest gap credited in one update, e.g. after the tab was hidden.
    const MAX_DELTA_MS: f64 = 500.0;

    /// A clock producing one tick per `frame_ms` milliseconds.
    pub fn from_frame_ms(frame_ms: u64) -> Self {
        Self {
            ms_per_tick: frame_ms.max(1) as f64,
            accumulator: 0.0,
            last_timestamp: None,
        }
    }

    /// Feed a wall-clock timestamp (from `performance.now()`) and get the
    /// number of ticks to run this frame.
    pub fn update(&mut self, now_ms: f64) -> u32 {
        let delta = match self.last_timestamp {
            Some(prev) => (now_ms - prev).clamp(0.0, Self::MAX_DELTA_MS),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        self.accumulator += delta;
        let ticks = (self.accumulator / self.ms_per_tick) as u32;
        self.accumulator -= ticks as f64 * self.ms_per_tick;
        ticks
    }
}
