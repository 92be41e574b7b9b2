use std::time::Instant;

/// Monotonic host time in seconds since the clock was created.
///
/// Frame timestamps and pointer timestamps must be read from the same
/// `HostClock`, otherwise the pointer idle timeout compares unrelated values.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    origin: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts host frame timestamps into bounded simulation steps.
///
/// A step is the elapsed host time clamped to `max_dt`. When the elapsed time
/// is unknown (first frame), zero, negative or NaN the `fallback_dt` is used
/// instead, so the integrator never sees a non-positive or non-finite step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_dt: f32,
    fallback_dt: f32,
    last: Option<f64>,
    elapsed: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new(max_dt: f32, fallback_dt: f32) -> Self {
        Self {
            max_dt,
            fallback_dt,
            last: None,
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Clamp a raw elapsed time (seconds) into a usable step.
    pub fn clamp(&self, raw: f32) -> f32 {
        if raw.is_nan() || raw <= 0.0 {
            self.fallback_dt
        } else {
            raw.min(self.max_dt)
        }
    }

    /// Advance to the host timestamp `now` and return the clamped step.
    pub fn advance_to(&mut self, now: f64) -> f32 {
        let raw = match self.last {
            Some(last) => (now - last) as f32,
            None => f32::NAN,
        };
        self.last = Some(now);
        self.record(raw)
    }

    /// Advance host time by `raw_dt` seconds and return `(now, step)`.
    ///
    /// Used when the caller drives the loop with explicit deltas instead of
    /// timestamps (headless runs, tests).
    pub fn advance_by(&mut self, raw_dt: f32) -> (f64, f32) {
        let host_step = if raw_dt.is_finite() && raw_dt > 0.0 { raw_dt as f64 } else { 0.0 };
        let now = self.last.unwrap_or(0.0) + host_step;
        self.last = Some(now);
        (now, self.record(raw_dt))
    }

    fn record(&mut self, raw: f32) -> f32 {
        let dt = self.clamp(raw);
        self.elapsed += dt as f64;
        self.frames += 1;
        dt
    }

    /// Simulated seconds, the sum of all clamped steps.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }
}
