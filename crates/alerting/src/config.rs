//! Notification gate configuration

use serde::{Deserialize, Serialize};

/// Minimum spacing between two notifications of the same category (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryCooldowns {
    pub blink_secs: f64,
    pub break_secs: f64,
    pub distance_secs: f64,
    pub posture_secs: f64,
    pub emotion_secs: f64,
    pub lighting_secs: f64,
}

impl Default for CategoryCooldowns {
    fn default() -> Self {
        Self {
            blink_secs: 300.0,
            break_secs: 900.0,
            distance_secs: 60.0,
            posture_secs: 600.0,
            emotion_secs: 600.0,
            lighting_secs: 1800.0,
        }
    }
}

impl CategoryCooldowns {
    /// No category spacing at all; only duplicate suppression applies
    pub fn none() -> Self {
        Self {
            blink_secs: 0.0,
            break_secs: 0.0,
            distance_secs: 0.0,
            posture_secs: 0.0,
            emotion_secs: 0.0,
            lighting_secs: 0.0,
        }
    }
}

/// Notification gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Nothing fires this long after monitoring starts (seconds)
    pub warmup_secs: f64,

    /// Blink rate below this triggers a reminder (blinks per minute)
    pub low_blink_rate_bpm: f64,

    /// Sitting longer than this triggers a break reminder (seconds)
    pub max_sitting_secs: f64,

    /// Eye distance below this is too close (cm)
    pub min_eye_distance_cm: f64,

    /// Poor posture must persist longer than this before alerting (seconds)
    pub bad_posture_secs: f64,

    /// Identical (title, message) pairs are never repeated within this window (seconds)
    pub duplicate_cooldown_secs: f64,

    /// Maximum notifications per hour before throttling
    pub max_per_hour: usize,

    pub cooldowns: CategoryCooldowns,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            warmup_secs: 30.0,
            low_blink_rate_bpm: 6.0,
            max_sitting_secs: 3600.0,
            min_eye_distance_cm: 40.0,
            bad_posture_secs: 600.0,
            duplicate_cooldown_secs: 10.0,
            max_per_hour: 20,
            cooldowns: CategoryCooldowns::default(),
        }
    }
}

impl GateConfig {
    /// Earlier, more frequent reminders
    pub fn strict() -> Self {
        Self {
            warmup_secs: 15.0,
            low_blink_rate_bpm: 8.0,
            max_sitting_secs: 2700.0,
            min_eye_distance_cm: 50.0,
            bad_posture_secs: 300.0,
            max_per_hour: 30,
            ..Default::default()
        }
    }

    /// Fewer, later reminders
    pub fn lenient() -> Self {
        Self {
            warmup_secs: 60.0,
            low_blink_rate_bpm: 4.0,
            max_sitting_secs: 5400.0,
            min_eye_distance_cm: 30.0,
            bad_posture_secs: 900.0,
            max_per_hour: 10,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered() {
        let strict = GateConfig::strict();
        let default = GateConfig::default();
        let lenient = GateConfig::lenient();

        assert!(strict.max_sitting_secs < default.max_sitting_secs);
        assert!(default.max_sitting_secs < lenient.max_sitting_secs);
        assert!(strict.min_eye_distance_cm > lenient.min_eye_distance_cm);
        assert!(strict.bad_posture_secs < lenient.bad_posture_secs);
    }
}
