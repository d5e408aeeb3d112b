//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Only built with the `logging` feature. The library itself only emits
//! events; binaries and tests opt into a subscriber here.
//!
//! Priority for determining the filter:
//! 1. the `level` argument (if provided)
//! 2. `U_FORECAST_LOG` environment variable (e.g. "info", "u_forecast=debug")
//! 3. default to `info`

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::errors::{ForecastError, Result};

/// Environment variable consulted when no level is passed.
pub const LOG_ENV: &str = "U_FORECAST_LOG";

/// Installs a global subscriber writing to stderr.
///
/// Fails if the filter does not parse or a subscriber is already set.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = resolve_filter(level, std::env::var(LOG_ENV).ok().as_deref())?;
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ForecastError::Config(format!("logging already initialised: {e}")))
}

fn resolve_filter(level: Option<&str>, env: Option<&str>) -> Result<EnvFilter> {
    let directive = level
        .or(env)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("info");
    EnvFilter::try_new(directive)
        .map_err(|e| ForecastError::Config(format!("invalid log filter {directive:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    fn max_level(level: Option<&str>, env: Option<&str>) -> Option<LevelFilter> {
        resolve_filter(level, env).unwrap().max_level_hint()
    }

    #[test]
    fn test_argument_wins_over_env() {
        assert_eq!(max_level(Some("debug"), Some("error")), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_env_then_default() {
        assert_eq!(max_level(None, Some("warn")), Some(LevelFilter::WARN));
        assert_eq!(max_level(None, Some("  ")), Some(LevelFilter::INFO));
        assert_eq!(max_level(None, None), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_invalid_filter() {
        assert!(matches!(
            resolve_filter(Some("u_forecast=loud"), None),
            Err(ForecastError::Config(_))
        ));
    }
}
