//! Forecast configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! default_start_spread_days = 10
//! cycle_policy = "reject"
//! seed = 42
//!
//! [[holidays]]
//! name = "Winter break"
//! start = "2024-12-23"
//! end = "2025-01-01"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{ForecastError, Result};
use crate::graph::CyclePolicy;
use crate::models::{Calendar, Holiday};

/// Settings for graph sorting and date propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Width, in working days, of the 90% range for when unconstrained
    /// tasks start: `today .. today + spread`.
    pub default_start_spread_days: f64,
    /// How topological sorting treats cycles.
    pub cycle_policy: CyclePolicy,
    /// Fixed seed for reproducible simulations. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Non-working date ranges on top of weekends.
    pub holidays: Vec<Holiday>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_start_spread_days: 10.0,
            cycle_policy: CyclePolicy::Reject,
            seed: None,
            holidays: Vec::new(),
        }
    }
}

impl ForecastConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), holidays = config.holidays.len(), "loaded config");
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        let spread = self.default_start_spread_days;
        if !spread.is_finite() || spread < 0.0 {
            warn!(spread, "invalid default start spread");
            return Err(ForecastError::Config(format!(
                "default_start_spread_days must be a non-negative number, got {spread}"
            )));
        }
        if let Some(h) = self.holidays.iter().find(|h| h.end < h.start) {
            warn!(holiday = %h.name, "holiday ends before it starts");
            return Err(ForecastError::Config(format!(
                "holiday '{}' ends ({}) before it starts ({})",
                h.name, h.end, h.start
            )));
        }
        Ok(())
    }

    /// A calendar anchored at `day0` with the configured holidays.
    pub fn calendar(&self, day0: chrono::NaiveDate) -> Calendar {
        Calendar::with_holidays(day0, &self.holidays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = ForecastConfig::from_toml_str("").unwrap();
        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.default_start_spread_days, 10.0);
        assert_eq!(config.cycle_policy, CyclePolicy::Reject);
    }

    #[test]
    fn test_full_document() {
        let config = ForecastConfig::from_toml_str(
            r#"
            default_start_spread_days = 5
            cycle_policy = "tolerate"
            seed = 7

            [[holidays]]
            name = "Break"
            start = "2024-12-23"
            end = "2024-12-27"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_start_spread_days, 5.0);
        assert_eq!(config.cycle_policy, CyclePolicy::Tolerate);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.holidays[0].dates().count(), 5);

        let cal = config.calendar(NaiveDate::from_ymd_opt(2024, 12, 2).unwrap());
        assert!(cal.is_day_off(NaiveDate::from_ymd_opt(2024, 12, 24).unwrap()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ForecastConfig::from_toml_str("default_start_spread_days = -1").unwrap_err();
        assert!(matches!(err, ForecastError::Config(_)));

        let err = ForecastConfig::from_toml_str(
            r#"
            [[holidays]]
            name = "Backwards"
            start = "2024-05-02"
            end = "2024-05-01"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Backwards"));

        let err = ForecastConfig::from_toml_str("cycle_policy = \"ignore\"").unwrap_err();
        assert!(matches!(err, ForecastError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("u-forecast-config-{}.toml", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "seed = 3").unwrap();
        drop(file);

        let config = ForecastConfig::load(&path).unwrap();
        assert_eq!(config.seed, Some(3));
        fs::remove_file(&path).unwrap();

        assert!(matches!(ForecastConfig::load(&path), Err(ForecastError::Io(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ForecastConfig {
            seed: Some(1),
            ..ForecastConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"cycle_policy\":\"reject\""));
        let back: ForecastConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
