//! Wall-clock cadence gate

use std::time::{Duration, Instant};

/// Configured seconds as a `Duration`.
///
/// Negative and NaN become zero; values too large to represent (including
/// infinity) saturate to `Duration::MAX` instead of panicking.
pub fn duration_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Minimum spacing between repeated runs of a check.
///
/// Due before the first run, then once `interval` has elapsed since the last
/// recorded run.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Cadence {
    /// Create a cadence with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Create a cadence from a (fractional) number of seconds
    pub fn every_secs(secs: f64) -> Self {
        Self::new(duration_from_secs(secs))
    }

    /// Whether a run is due at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Record a run at `now`
    pub fn mark(&mut self, now: Instant) {
        self.last_run = Some(now);
    }

    /// Check and record in one step; returns whether the run should happen
    pub fn ready(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }

    /// Configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time of the last recorded run
    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    /// Forget the last run so the next check is due immediately
    pub fn reset(&mut self) {
        self.last_run = None;
    }
}
