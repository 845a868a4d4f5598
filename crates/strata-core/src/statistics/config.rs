// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sampling configuration of a statistics provider, loadable from JSON.

use crate::statistics::error::{StatisticsError, StatisticsResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Unit of a configured time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Milliseconds
    Milliseconds,
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
}

/// An amount of time expressed as `amount` x `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Number of units
    pub amount: u64,
    /// The unit
    pub unit: TimeUnit,
}

impl TimeSpan {
    /// Creates a new time span.
    pub const fn new(amount: u64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    /// Converts the span into a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        match self.unit {
            TimeUnit::Milliseconds => Duration::from_millis(self.amount),
            TimeUnit::Seconds => Duration::from_secs(self.amount),
            TimeUnit::Minutes => Duration::from_secs(self.amount.saturating_mul(60)),
            TimeUnit::Hours => Duration::from_secs(self.amount.saturating_mul(3_600)),
        }
    }

    /// The span in whole milliseconds, or `None` if it does not fit in a `u64`.
    pub fn checked_millis(&self) -> Option<u64> {
        let millis_per_unit = match self.unit {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Seconds => 1_000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Hours => 3_600_000,
        };
        self.amount.checked_mul(millis_per_unit)
    }

    /// The span in whole milliseconds, saturating at `u64::MAX`.
    pub fn as_millis(&self) -> u64 {
        self.checked_millis().unwrap_or(u64::MAX)
    }
}

/// Sampling configuration shared by every statistic of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsProviderConfiguration {
    /// Window over which rates, ratios and latencies are averaged
    pub average_window: TimeSpan,
    /// Number of samples retained per statistic
    pub history_size: usize,
    /// Period between two samples
    pub history_interval: TimeSpan,
    /// Sampling of a statistic stops once it has not been queried for this long
    pub time_to_disable: TimeSpan,
}

impl StatisticsProviderConfiguration {
    /// Creates a configuration from its four settings.
    pub fn new(
        average_window: TimeSpan,
        history_size: usize,
        history_interval: TimeSpan,
        time_to_disable: TimeSpan,
    ) -> Self {
        Self {
            average_window,
            history_size,
            history_interval,
            time_to_disable,
        }
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading statistics configuration {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("parsing statistics configuration {}", path.display()))?;
        config.validate()?;
        log::debug!("Loaded statistics configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> StatisticsResult<()> {
        if self.history_size == 0 {
            return Err(StatisticsError::InvalidConfiguration(
                "history_size must be at least 1".to_string(),
            ));
        }
        let spans = [
            ("average_window", &self.average_window),
            ("history_interval", &self.history_interval),
            ("time_to_disable", &self.time_to_disable),
        ];
        for (field, span) in spans {
            if span.checked_millis().is_none() {
                return Err(StatisticsError::InvalidConfiguration(format!(
                    "{field} does not fit in 64-bit milliseconds"
                )));
            }
        }
        if self.average_window.as_millis() == 0 {
            return Err(StatisticsError::InvalidConfiguration(
                "average_window must be positive".to_string(),
            ));
        }
        if self.history_interval.as_millis() == 0 {
            return Err(StatisticsError::InvalidConfiguration(
                "history_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StatisticsProviderConfiguration {
    fn default() -> Self {
        Self {
            average_window: TimeSpan::new(1, TimeUnit::Minutes),
            history_size: 100,
            history_interval: TimeSpan::new(1, TimeUnit::Seconds),
            time_to_disable: TimeSpan::new(10, TimeUnit::Minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = StatisticsProviderConfiguration::default();
        assert_eq!(config.average_window.as_duration(), Duration::from_secs(60));
        assert_eq!(config.history_size, 100);
        assert_eq!(config.history_interval.as_millis(), 1_000);
        assert_eq!(config.time_to_disable.as_millis(), 600_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"
        {
            "average_window": { "amount": 30, "unit": "seconds" },
            "history_size": 10,
            "history_interval": { "amount": 500, "unit": "milliseconds" },
            "time_to_disable": { "amount": 1, "unit": "hours" }
        }"#;

        let config = StatisticsProviderConfiguration::from_json(json).unwrap();
        assert_eq!(config.average_window, TimeSpan::new(30, TimeUnit::Seconds));
        assert_eq!(config.history_size, 10);
        assert_eq!(config.history_interval.as_millis(), 500);
        assert_eq!(config.time_to_disable.as_millis(), 3_600_000);
    }

    #[test]
    fn test_validate_rejects_empty_history() {
        let config = StatisticsProviderConfiguration {
            history_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StatisticsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_spans_overflowing_millis() {
        let span = TimeSpan::new(u64::MAX / 1_000, TimeUnit::Hours);
        assert_eq!(span.checked_millis(), None);
        assert_eq!(span.as_millis(), u64::MAX);

        let json = format!(
            r#"{{
            "average_window": {{ "amount": 1, "unit": "minutes" }},
            "history_size": 10,
            "history_interval": {{ "amount": 1, "unit": "seconds" }},
            "time_to_disable": {{ "amount": {}, "unit": "hours" }}
        }}"#,
            u64::MAX / 1_000
        );
        let config = StatisticsProviderConfiguration::from_json(&json).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StatisticsError::InvalidConfiguration(ref msg) if msg.contains("time_to_disable")));

        let largest = TimeSpan::new(u64::MAX / 3_600_000, TimeUnit::Hours);
        assert!(largest.checked_millis().is_some());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.json");

        let config = StatisticsProviderConfiguration::new(
            TimeSpan::new(5, TimeUnit::Seconds),
            20,
            TimeSpan::new(250, TimeUnit::Milliseconds),
            TimeSpan::new(2, TimeUnit::Minutes),
        );
        config.to_file(&path).unwrap();

        let loaded = StatisticsProviderConfiguration::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_file_reports_path() {
        let err = StatisticsProviderConfiguration::from_file("/nonexistent/strata.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/strata.json"));
    }
}
