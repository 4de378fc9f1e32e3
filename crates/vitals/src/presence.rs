//! Sitting stopwatch

use inspector::duration_from_secs;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Presence tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Absences at least this long end the session (seconds)
    pub break_threshold_secs: f64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            break_threshold_secs: 120.0,
        }
    }
}

/// Present/absent state machine with break-reset semantics.
///
/// A short absence is an interruption: the session keeps its start time and
/// the absent wall time still counts. An absence of at least the break
/// threshold starts a fresh session on return.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    break_threshold: Duration,
    present: bool,
    session_start: Option<Instant>,
    break_start: Option<Instant>,
    /// Last observation with the person present; freezes the reported time while absent
    last_present_at: Option<Instant>,
    sessions_started: u64,
}

impl PresenceTracker {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            break_threshold: duration_from_secs(config.break_threshold_secs),
            present: false,
            session_start: None,
            break_start: None,
            last_present_at: None,
            sessions_started: 0,
        }
    }

    pub fn observe(&mut self, present: bool, now: Instant) {
        match (self.present, present) {
            (false, true) => {
                let resume = match (self.session_start, self.break_start) {
                    (Some(_), Some(break_start)) => {
                        now.saturating_duration_since(break_start) < self.break_threshold
                    }
                    (Some(_), None) => true,
                    (None, _) => false,
                };

                if resume {
                    debug!("Brief absence, session continues");
                } else {
                    if self.session_start.is_some() {
                        info!("Break taken, sitting session reset");
                    }
                    self.session_start = Some(now);
                    self.sessions_started += 1;
                }
                self.break_start = None;
                self.last_present_at = Some(now);
            }
            (true, false) => {
                self.break_start = Some(now);
            }
            (true, true) => {
                self.last_present_at = Some(now);
            }
            (false, false) => {}
        }
        self.present = present;
    }

    /// Seconds in the current session; frozen while absent
    pub fn current_session_seconds(&self, now: Instant) -> f64 {
        let Some(start) = self.session_start else {
            return 0.0;
        };
        let until = if self.present {
            now
        } else {
            self.last_present_at.unwrap_or(start)
        };
        until.saturating_duration_since(start).as_secs_f64()
    }

    /// Seconds since the person left; zero while present
    pub fn break_seconds(&self, now: Instant) -> f64 {
        match (self.present, self.break_start) {
            (false, Some(start)) => now.saturating_duration_since(start).as_secs_f64(),
            _ => 0.0,
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(PresenceConfig::default())
    }
}
