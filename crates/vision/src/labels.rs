//! Categorical detector outputs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Posture verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureLabel {
    Good,
    Bad,
}

impl PostureLabel {
    /// Interpret a free-text model reply.
    ///
    /// `BAD` anywhere wins over `GOOD`; a reply with neither is rejected.
    pub fn parse_verdict(text: &str) -> Option<Self> {
        let upper = text.to_uppercase();
        if upper.contains("BAD") {
            Some(PostureLabel::Bad)
        } else if upper.contains("GOOD") {
            Some(PostureLabel::Good)
        } else {
            None
        }
    }
}

impl fmt::Display for PostureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostureLabel::Good => f.write_str("good"),
            PostureLabel::Bad => f.write_str("bad"),
        }
    }
}

/// Broad valence of an emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

/// Dominant facial emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Neutral,
    Happy,
    Surprise,
    Sad,
    Angry,
    Disgust,
    Fear,
    Contempt,
}

impl Emotion {
    /// Classifier output order (FER+)
    pub const OUTPUT_ORDER: [Emotion; 8] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Surprise,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Contempt,
    ];

    /// Parse a label as emitted by common emotion models
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "neutral" => Some(Emotion::Neutral),
            "happy" | "happiness" => Some(Emotion::Happy),
            "surprise" | "surprised" => Some(Emotion::Surprise),
            "sad" | "sadness" => Some(Emotion::Sad),
            "angry" | "anger" => Some(Emotion::Angry),
            "disgust" | "disgusted" => Some(Emotion::Disgust),
            "fear" | "fearful" => Some(Emotion::Fear),
            "contempt" => Some(Emotion::Contempt),
            _ => None,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::OUTPUT_ORDER.get(index).copied()
    }

    pub fn mood(&self) -> Mood {
        match self {
            Emotion::Happy | Emotion::Surprise => Mood::Positive,
            Emotion::Neutral => Mood::Neutral,
            Emotion::Sad | Emotion::Angry | Emotion::Disgust | Emotion::Fear | Emotion::Contempt => {
                Mood::Negative
            }
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Surprise => "surprise",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Contempt => "contempt",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict() {
        assert_eq!(PostureLabel::parse_verdict("GOOD"), Some(PostureLabel::Good));
        assert_eq!(PostureLabel::parse_verdict("bad\n"), Some(PostureLabel::Bad));
        assert_eq!(
            PostureLabel::parse_verdict("Not GOOD, rather BAD"),
            Some(PostureLabel::Bad)
        );
        assert_eq!(PostureLabel::parse_verdict("I cannot tell"), None);
        assert_eq!(PostureLabel::parse_verdict(""), None);
    }

    #[test]
    fn test_emotion_labels_round_trip_display() {
        for emotion in Emotion::OUTPUT_ORDER {
            assert_eq!(Emotion::from_label(&emotion.to_string()), Some(emotion));
        }
        assert_eq!(Emotion::from_label(" Happiness "), Some(Emotion::Happy));
        assert_eq!(Emotion::from_label("bored"), None);
    }

    #[test]
    fn test_moods() {
        assert_eq!(Emotion::Happy.mood(), Mood::Positive);
        assert_eq!(Emotion::Fear.mood(), Mood::Negative);
        assert_eq!(Emotion::Neutral.mood(), Mood::Neutral);
        assert_eq!(Emotion::from_index(3), Some(Emotion::Sad));
        assert_eq!(Emotion::from_index(8), None);
    }
}
