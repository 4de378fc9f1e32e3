//! Notification Gate Implementation

use crate::config::GateConfig;
use chrono::{DateTime, Utc};
use inspector::{duration_from_secs, Reading};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vision::{Lighting, Mood, PostureLabel};
use vitals::CurrentSignals;

const HOUR: Duration = Duration::from_secs(3600);

const POSITIVE_MESSAGES: [&str; 3] = [
    "You're looking great today. Keep up the good energy!",
    "Nice to see you smiling. Keep it going!",
    "Good mood spotted. Share it with someone around you!",
];

const NEGATIVE_MESSAGES: [&str; 3] = [
    "Looks like a tough moment. Take a slow, deep breath.",
    "Feeling low? A short walk or a glass of water can help.",
    "Be kind to yourself. A quick break might do you good.",
];

/// Kind of notification; each kind has its own cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Blink,
    Break,
    Distance,
    Posture,
    Emotion,
    Lighting,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Blink => "blink",
            AlertCategory::Break => "break",
            AlertCategory::Distance => "distance",
            AlertCategory::Posture => "posture",
            AlertCategory::Emotion => "emotion",
            AlertCategory::Lighting => "lighting",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

/// Rule output before throttling
struct Candidate {
    category: AlertCategory,
    title: &'static str,
    message: String,
}

fn secs(value: f64) -> Duration {
    duration_from_secs(value)
}

/// Decides which notifications to surface for a signal snapshot
pub struct NotificationGate {
    config: GateConfig,
    /// Monitoring start; drives the warm-up
    started_at: Instant,
    /// Last fire per category
    last_by_category: HashMap<AlertCategory, Instant>,
    /// Last fire per exact (title, message)
    last_by_message: HashMap<(String, String), Instant>,
    /// Lifetime fires per category
    fired: HashMap<AlertCategory, u64>,
    /// Start of the current poor-posture streak
    bad_posture_since: Option<Instant>,
    /// Next emotion message to use
    emotion_rotation: usize,
    /// Notifications in the current hour
    hourly_count: usize,
    hour_start: Instant,
}

impl NotificationGate {
    pub fn new(config: GateConfig, started_at: Instant) -> Self {
        info!(
            warmup_secs = config.warmup_secs,
            max_per_hour = config.max_per_hour,
            "Creating notification gate"
        );
        Self {
            config,
            started_at,
            last_by_category: HashMap::new(),
            last_by_message: HashMap::new(),
            fired: HashMap::new(),
            bad_posture_since: None,
            emotion_rotation: 0,
            hourly_count: 0,
            hour_start: started_at,
        }
    }

    /// Evaluate all rules against `signals` at `now`
    pub fn evaluate(&mut self, signals: &CurrentSignals, now: Instant) -> Vec<Notification> {
        self.track_posture(&signals.posture, now);

        if now.saturating_duration_since(self.started_at) < secs(self.config.warmup_secs) {
            return Vec::new();
        }

        if now.saturating_duration_since(self.hour_start) >= HOUR {
            self.hourly_count = 0;
            self.hour_start = now;
        }

        let duplicate_window = secs(self.config.duplicate_cooldown_secs);
        self.last_by_message
            .retain(|_, at| now.saturating_duration_since(*at) < duplicate_window);

        let mut fired = Vec::new();
        for candidate in self.candidates(signals, now) {
            if !self.admit(&candidate, now) {
                continue;
            }

            self.record(&candidate, now);
            info!(category = %candidate.category, title = candidate.title, "Notification fired");
            fired.push(Notification {
                category: candidate.category,
                title: candidate.title.to_string(),
                message: candidate.message,
                issued_at: Utc::now(),
            });
        }
        fired
    }

    /// A `Good` reading ends the streak; missing readings leave it alone
    fn track_posture(&mut self, posture: &Reading<PostureLabel>, now: Instant) {
        match posture {
            Reading::Value(PostureLabel::Bad) => {
                if self.bad_posture_since.is_none() {
                    debug!("Poor posture streak started");
                    self.bad_posture_since = Some(now);
                }
            }
            Reading::Value(PostureLabel::Good) => {
                if self.bad_posture_since.take().is_some() {
                    debug!("Poor posture streak cleared");
                }
            }
            Reading::Unknown | Reading::Unavailable => {}
        }
    }

    fn candidates(&self, signals: &CurrentSignals, now: Instant) -> Vec<Candidate> {
        let mut out = Vec::new();

        if let Some(&rate) = signals.blink_rate_bpm.value().filter(|_| signals.present) {
            if rate < self.config.low_blink_rate_bpm {
                out.push(Candidate {
                    category: AlertCategory::Blink,
                    title: "Blink Reminder",
                    message: "Your blink rate is low. Blink more and rest your eyes.".to_string(),
                });
            }
        }

        // Frozen while away; only remind someone who is still sitting
        if signals.present && signals.sitting_seconds > self.config.max_sitting_secs {
            out.push(Candidate {
                category: AlertCategory::Break,
                title: "Sitting Alert",
                message: "You've been sitting too long. Take a walk!".to_string(),
            });
        }

        if let Some(&distance) = signals.eye_distance_cm.value() {
            if distance < self.config.min_eye_distance_cm {
                out.push(Candidate {
                    category: AlertCategory::Distance,
                    title: "Eye Distance Alert",
                    message: "You are too close to the screen!".to_string(),
                });
            }
        }

        if let Some(since) = self.bad_posture_since {
            if now.saturating_duration_since(since) > secs(self.config.bad_posture_secs) {
                out.push(Candidate {
                    category: AlertCategory::Posture,
                    title: "Posture Alert",
                    message: "Check your posture!".to_string(),
                });
            }
        }

        if let Some(emotion) = signals.emotion.value().filter(|_| signals.present) {
            let pool: &[&str] = match emotion.mood() {
                Mood::Positive => &POSITIVE_MESSAGES,
                Mood::Negative => &NEGATIVE_MESSAGES,
                Mood::Neutral => &[],
            };
            if !pool.is_empty() {
                out.push(Candidate {
                    category: AlertCategory::Emotion,
                    title: "Emotion Update",
                    message: pool[self.emotion_rotation % pool.len()].to_string(),
                });
            }
        }

        if let Some(Lighting::Dark) = signals.lighting.value() {
            out.push(Candidate {
                category: AlertCategory::Lighting,
                title: "Lighting Alert",
                message: "Your room is too dark. Turn on a light to reduce eye strain.".to_string(),
            });
        }

        out
    }

    fn admit(&self, candidate: &Candidate, now: Instant) -> bool {
        let cooldown = secs(self.category_cooldown(candidate.category));
        if let Some(&last) = self.last_by_category.get(&candidate.category) {
            if now.saturating_duration_since(last) < cooldown {
                debug!(category = %candidate.category, "Notification suppressed: category cooldown");
                return false;
            }
        }

        let key = (candidate.title.to_string(), candidate.message.clone());
        if self.last_by_message.contains_key(&key) {
            debug!(category = %candidate.category, "Notification suppressed: duplicate");
            return false;
        }

        if self.hourly_count >= self.config.max_per_hour {
            warn!(category = %candidate.category, "Notification throttled: hourly cap reached");
            return false;
        }

        true
    }

    fn record(&mut self, candidate: &Candidate, now: Instant) {
        self.last_by_category.insert(candidate.category, now);
        self.last_by_message
            .insert((candidate.title.to_string(), candidate.message.clone()), now);
        *self.fired.entry(candidate.category).or_insert(0) += 1;
        self.hourly_count += 1;

        match candidate.category {
            AlertCategory::Posture => self.bad_posture_since = Some(now),
            AlertCategory::Emotion => self.emotion_rotation = self.emotion_rotation.wrapping_add(1),
            _ => {}
        }
    }

    fn category_cooldown(&self, category: AlertCategory) -> f64 {
        let c = &self.config.cooldowns;
        match category {
            AlertCategory::Blink => c.blink_secs,
            AlertCategory::Break => c.break_secs,
            AlertCategory::Distance => c.distance_secs,
            AlertCategory::Posture => c.posture_secs,
            AlertCategory::Emotion => c.emotion_secs,
            AlertCategory::Lighting => c.lighting_secs,
        }
    }

    /// Lifetime notifications of one category
    pub fn fired_count(&self, category: AlertCategory) -> u64 {
        self.fired.get(&category).copied().unwrap_or(0)
    }

    /// Notifications in the current hour
    pub fn hourly_count(&self) -> usize {
        self.hourly_count
    }

    /// Whether a poor-posture streak is running
    pub fn bad_posture_since(&self) -> Option<Instant> {
        self.bad_posture_since
    }

    /// Forget all history and restart the warm-up at `now`
    pub fn reset(&mut self, now: Instant) {
        self.started_at = now;
        self.hour_start = now;
        self.last_by_category.clear();
        self.last_by_message.clear();
        self.fired.clear();
        self.bad_posture_since = None;
        self.emotion_rotation = 0;
        self.hourly_count = 0;
    }
}
