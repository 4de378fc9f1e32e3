//! Tracing subscriber setup

use crate::config::{LogFormat, LoggingConfig};
use crate::MonitorError;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Filter precedence: `filter` from the config, then `RUST_LOG`, then `level`.
/// Calling this twice returns an error instead of panicking.
pub fn init_logging(config: &LoggingConfig) -> Result<(), MonitorError> {
    let filter = match config.filter.as_deref() {
        Some(directive) => EnvFilter::try_new(directive),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level)),
    }
    .map_err(|e| MonitorError::Logging(format!("invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| MonitorError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        let config = LoggingConfig {
            filter: Some("monitor=notalevel".into()),
            ..Default::default()
        };
        assert!(matches!(init_logging(&config), Err(MonitorError::Logging(_))));
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig {
            filter: Some("warn".into()),
            ..Default::default()
        };
        // Another test in this binary may have installed one already
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
