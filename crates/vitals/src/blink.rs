//! Blink detection and blink-rate windows

use inspector::duration_from_secs;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Blink detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// EAR below this counts as a closed eye
    pub ear_threshold: f64,

    /// Closed frames required before reopening counts as a blink
    pub min_consecutive_closed: u32,

    /// Blink-rate window (seconds)
    pub window_secs: f64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.21,
            min_consecutive_closed: 2,
            window_secs: 20.0,
        }
    }
}

/// A registered blink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkEvent {
    /// How many frames the eyes were closed
    pub closed_frames: u32,
    /// Lifetime blink count including this one
    pub total: u64,
}

/// Debounced blink counter with a windowed rate estimate
#[derive(Debug, Clone)]
pub struct BlinkAccumulator {
    config: BlinkConfig,
    window: Duration,
    interval_start: Instant,
    interval_blinks: u32,
    closed_frames: u32,
    total_blinks: u64,
    rate_bpm: Option<f64>,
}

impl BlinkAccumulator {
    pub fn new(config: BlinkConfig, now: Instant) -> Self {
        let window = duration_from_secs(config.window_secs).max(Duration::from_millis(1));
        Self {
            config,
            window,
            interval_start: now,
            interval_blinks: 0,
            closed_frames: 0,
            total_blinks: 0,
            rate_bpm: None,
        }
    }

    /// Feed the averaged EAR of one frame.
    ///
    /// Skip frames without a face entirely; do not pass a placeholder.
    pub fn observe(&mut self, ear: f64) -> Option<BlinkEvent> {
        if !ear.is_finite() {
            return None;
        }

        if ear < self.config.ear_threshold {
            self.closed_frames = self.closed_frames.saturating_add(1);
            return None;
        }

        let closed = std::mem::take(&mut self.closed_frames);
        if closed >= self.config.min_consecutive_closed {
            self.total_blinks += 1;
            self.interval_blinks += 1;
            Some(BlinkEvent {
                closed_frames: closed,
                total: self.total_blinks,
            })
        } else {
            None
        }
    }

    /// Close the current window if it has run its length.
    ///
    /// Returns the new rate; `None` keeps the previous one.
    pub fn maybe_finalize_window(&mut self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.window {
            return None;
        }

        let rate = self.interval_blinks as f64 / elapsed.as_secs_f64() * 60.0;
        debug!(blinks = self.interval_blinks, rate_bpm = rate, "Blink window closed");

        self.interval_start = now;
        self.interval_blinks = 0;
        self.rate_bpm = Some(rate);
        Some(rate)
    }

    /// Last finalised rate; `None` before the first window closes
    pub fn rate_bpm(&self) -> Option<f64> {
        self.rate_bpm
    }

    pub fn total_blinks(&self) -> u64 {
        self.total_blinks
    }

    pub fn interval_blinks(&self) -> u32 {
        self.interval_blinks
    }

    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OPEN: f64 = 0.30;
    const CLOSED: f64 = 0.15;

    fn accumulator() -> (BlinkAccumulator, Instant) {
        let t0 = Instant::now();
        (BlinkAccumulator::new(BlinkConfig::default(), t0), t0)
    }

    #[test]
    fn test_single_closed_frame_is_not_a_blink() {
        let (mut acc, _) = accumulator();
        assert_eq!(acc.observe(OPEN), None);
        assert_eq!(acc.observe(CLOSED), None);
        assert_eq!(acc.observe(OPEN), None);
        assert_eq!(acc.total_blinks(), 0);
    }

    #[test]
    fn test_two_closed_frames_then_open_is_a_blink() {
        let (mut acc, _) = accumulator();
        acc.observe(CLOSED);
        acc.observe(CLOSED);
        acc.observe(CLOSED);
        let event = acc.observe(OPEN).unwrap();
        assert_eq!(event.closed_frames, 3);
        assert_eq!(event.total, 1);

        // Threshold itself counts as open
        acc.observe(CLOSED);
        acc.observe(CLOSED);
        assert!(acc.observe(0.21).is_some());
        assert_eq!(acc.total_blinks(), 2);
    }

    #[test]
    fn test_non_finite_ear_is_ignored() {
        let (mut acc, _) = accumulator();
        acc.observe(CLOSED);
        acc.observe(f64::NAN);
        acc.observe(CLOSED);
        assert!(acc.observe(OPEN).is_some());
    }

    #[test]
    fn test_rate_after_window() {
        let (mut acc, t0) = accumulator();
        for _ in 0..3 {
            acc.observe(CLOSED);
            acc.observe(CLOSED);
            acc.observe(OPEN);
        }

        assert_eq!(acc.maybe_finalize_window(t0 + Duration::from_secs(10)), None);
        assert_eq!(acc.rate_bpm(), None);

        let rate = acc.maybe_finalize_window(t0 + Duration::from_secs(20)).unwrap();
        assert!((rate - 9.0).abs() < 1e-9);
        assert_eq!(acc.interval_blinks(), 0);

        // Stale but valid until the next window closes
        assert_eq!(acc.maybe_finalize_window(t0 + Duration::from_secs(25)), None);
        assert_eq!(acc.rate_bpm(), Some(rate));

        let next = acc.maybe_finalize_window(t0 + Duration::from_secs(40)).unwrap();
        assert_eq!(next, 0.0);
        assert_eq!(acc.total_blinks(), 3);
    }

    #[test]
    fn test_unbounded_window_never_closes() {
        let t0 = Instant::now();
        let config = BlinkConfig {
            window_secs: f64::INFINITY,
            ..Default::default()
        };
        let mut acc = BlinkAccumulator::new(config, t0);
        assert_eq!(acc.maybe_finalize_window(t0 + Duration::from_secs(86_400)), None);
        assert_eq!(acc.rate_bpm(), None);
    }

    /// Blinks counted by a direct scan: closed runs of length >= 2 that end
    /// with an open frame
    fn expected_blinks(seq: &[bool]) -> u64 {
        let mut run = 0;
        let mut blinks = 0;
        for &closed in seq {
            if closed {
                run += 1;
            } else {
                if run >= 2 {
                    blinks += 1;
                }
                run = 0;
            }
        }
        blinks
    }

    proptest! {
        #[test]
        fn prop_blinks_need_consecutive_closed_frames(seq in proptest::collection::vec(any::<bool>(), 0..200)) {
            let (mut acc, _) = accumulator();
            for &closed in &seq {
                acc.observe(if closed { CLOSED } else { OPEN });
            }
            prop_assert_eq!(acc.total_blinks(), expected_blinks(&seq));
        }

        #[test]
        fn prop_isolated_closed_frames_never_blink(n in 0usize..100) {
            let (mut acc, _) = accumulator();
            for _ in 0..n {
                acc.observe(CLOSED);
                acc.observe(OPEN);
            }
            prop_assert_eq!(acc.total_blinks(), 0);
        }
    }
}
