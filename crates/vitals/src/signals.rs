//! Current-signals snapshot

use inspector::Reading;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vision::{Emotion, Lighting, PostureLabel};

/// Latest known value of every monitored quantity.
///
/// Owned by the monitoring loop; everything else gets a copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentSignals {
    /// Sequence number of the frame this snapshot was built from
    pub sequence: u64,

    /// Whether a person is at the desk
    pub present: bool,

    /// Blinks per minute over the last closed window
    pub blink_rate_bpm: Reading<f64>,

    /// Lifetime blink count
    pub total_blinks: u64,

    /// Current sitting session (seconds)
    pub sitting_seconds: f64,

    /// Eye-to-screen distance (cm)
    pub eye_distance_cm: Reading<f64>,

    pub posture: Reading<PostureLabel>,

    pub emotion: Reading<Emotion>,

    pub lighting: Reading<Lighting>,
}

fn fixed(reading: &Reading<f64>, decimals: usize) -> String {
    match reading {
        Reading::Value(v) => format!("{:.*}", decimals, v),
        other => other.to_string(),
    }
}

impl CurrentSignals {
    /// Display-ready name/value pairs for the signals sink
    pub fn named_values(&self) -> BTreeMap<&'static str, String> {
        let mut values = BTreeMap::new();
        values.insert("present", if self.present { "yes" } else { "no" }.to_string());
        values.insert("blink_rate_bpm", fixed(&self.blink_rate_bpm, 1));
        values.insert("total_blinks", self.total_blinks.to_string());
        values.insert("sitting_seconds", format!("{:.0}", self.sitting_seconds));
        values.insert("eye_distance_cm", fixed(&self.eye_distance_cm, 1));
        values.insert("posture", self.posture.to_string());
        values.insert("emotion", self.emotion.to_string());
        values.insert("lighting", self.lighting.to_string());
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_values() {
        let signals = CurrentSignals {
            present: true,
            blink_rate_bpm: Reading::Value(9.0),
            total_blinks: 3,
            sitting_seconds: 61.6,
            eye_distance_cm: Reading::Unavailable,
            posture: Reading::Value(PostureLabel::Bad),
            ..Default::default()
        };

        let values = signals.named_values();
        assert_eq!(values["present"], "yes");
        assert_eq!(values["blink_rate_bpm"], "9.0");
        assert_eq!(values["sitting_seconds"], "62");
        assert_eq!(values["eye_distance_cm"], "error");
        assert_eq!(values["posture"], "bad");
        assert_eq!(values["emotion"], "unknown");
        assert_eq!(values.len(), 8);
    }

    #[test]
    fn test_serializes_sentinels() {
        let signals = CurrentSignals {
            emotion: Reading::Value(Emotion::Happy),
            ..Default::default()
        };
        let json = serde_json::to_value(&signals).unwrap();
        assert_eq!(json["emotion"]["state"], "value");
        assert_eq!(json["emotion"]["value"], "happy");
        assert_eq!(json["posture"]["state"], "unknown");
    }
}
