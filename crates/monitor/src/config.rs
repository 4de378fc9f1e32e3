//! Monitor configuration

use crate::MonitorError;
use alerting::GateConfig;
use camera_capture::SourceConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vision::{DistanceConfig, EmotionConfig, PostureConfig};
use vitals::{BlinkConfig, PresenceConfig};

/// Environment variable prefix; `WELLNESS__POSTURE__API_KEY` sets `posture.api_key`
pub const ENV_PREFIX: &str = "WELLNESS";

/// Default loop period, roughly a display refresh
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 30;

/// How expensive inspections are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionMode {
    /// Spawned onto the runtime; results are applied on a later tick
    #[default]
    Background,
    /// Awaited within the tick
    Inline,
}

/// Spacing of the periodic checks (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub eye_distance_secs: f64,
    pub lighting_secs: f64,
    pub posture_secs: f64,
    pub emotion_secs: f64,
    /// Upper bound on one posture or emotion run (milliseconds)
    pub probe_timeout_ms: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            eye_distance_secs: 5.0,
            lighting_secs: 10.0,
            posture_secs: 30.0,
            emotion_secs: 30.0,
            probe_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when no filter is given and `RUST_LOG` is unset
    pub level: String,
    /// Full `EnvFilter` directive, e.g. `monitor=debug,inspector=warn`
    pub filter: Option<String>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            filter: None,
            format: LogFormat::Text,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Loop period (milliseconds)
    pub tick_interval_ms: u64,
    pub inspection_mode: InspectionMode,
    pub source: SourceConfig,
    pub blink: BlinkConfig,
    pub presence: PresenceConfig,
    pub cadence: CadenceConfig,
    pub distance: DistanceConfig,
    pub posture: PostureConfig,
    pub emotion: EmotionConfig,
    pub gate: GateConfig,
    pub logging: LoggingConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            inspection_mode: InspectionMode::default(),
            source: SourceConfig::default(),
            blink: BlinkConfig::default(),
            presence: PresenceConfig::default(),
            cadence: CadenceConfig::default(),
            distance: DistanceConfig::default(),
            posture: PostureConfig::default(),
            emotion: EmotionConfig::default(),
            gate: GateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Layer an optional file and `WELLNESS__*` environment variables over the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, MonitorError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__"),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| MonitorError::Config(e.to_string()))
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = MonitorConfig::load_with_prefix(None, "WELLNESS_TEST_DEFAULTS").unwrap();
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(config.inspection_mode, InspectionMode::Background);
        assert_eq!(config.blink.ear_threshold, 0.21);
        assert_eq!(config.presence.break_threshold_secs, 120.0);
        assert_eq!(config.gate.warmup_secs, 30.0);
        assert!(!config.posture.is_enabled());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = write_temp(
            "monitor-partial.toml",
            r#"
tick_interval_ms = 50
inspection_mode = "inline"

[cadence]
posture_secs = 60.0

[gate]
max_per_hour = 5
"#,
        );

        let config = MonitorConfig::load_with_prefix(Some(&path), "WELLNESS_TEST_FILE").unwrap();
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.inspection_mode, InspectionMode::Inline);
        assert_eq!(config.cadence.posture_secs, 60.0);
        assert_eq!(config.cadence.emotion_secs, 30.0);
        assert_eq!(config.gate.max_per_hour, 5);
        assert_eq!(config.gate.min_eye_distance_cm, 40.0);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("WELLNESS_TEST_ENV__POSTURE__API_KEY", "from-env");
        std::env::set_var("WELLNESS_TEST_ENV__GATE__WARMUP_SECS", "5");

        let config = MonitorConfig::load_with_prefix(None, "WELLNESS_TEST_ENV").unwrap();
        assert_eq!(config.posture.api_key.as_deref(), Some("from-env"));
        assert!(config.posture.is_enabled());
        assert_eq!(config.gate.warmup_secs, 5.0);

        std::env::remove_var("WELLNESS_TEST_ENV__POSTURE__API_KEY");
        std::env::remove_var("WELLNESS_TEST_ENV__GATE__WARMUP_SECS");
    }

    #[test]
    fn test_missing_file_is_error() {
        let missing = std::env::temp_dir().join("definitely-missing-monitor-config.toml");
        let err = MonitorConfig::load_with_prefix(Some(&missing), "WELLNESS_TEST_MISSING").unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }
}
