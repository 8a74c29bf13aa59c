//! Detector configuration
//!
//! Thresholds, debounce and timing parameters shared by the window statistic,
//! the phase detector and the live monitor. All fields have defaults, so a
//! configuration file only needs to list the values it overrides.

use crate::error::FallError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound of the impact band (inclusive)
pub const DEFAULT_IMPACT_LOW: f64 = 6.0;

/// Upper bound of the impact band (inclusive)
pub const DEFAULT_IMPACT_HIGH: f64 = 10.0;

/// Magnitude below which the device counts as stabilized (exclusive)
pub const DEFAULT_STABILIZE_MAX: f64 = 2.0;

/// How long stabilization must hold before a fall is counted
pub const DEFAULT_STABILIZE_DURATION_MS: u64 = 5_000;

/// Trailing window for the max-magnitude statistic
pub const DEFAULT_WINDOW_DURATION_MS: u64 = 5_000;

/// Period of the eviction/recompute tick
pub const DEFAULT_EVICTION_INTERVAL_MS: u64 = 1_000;

/// Nominal sensor sampling period
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 10;

/// Optional free-fall precondition for the impact latch.
///
/// When present on a [`DetectorConfig`], an impact only latches if a run of
/// samples below `max_magnitude` lasting at least `min_duration_ms` ended no
/// more than `impact_window_ms` before the impact sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeFallConfig {
    /// Magnitude below which a sample counts as free fall (exclusive)
    pub max_magnitude: f64,
    /// Minimum length of the free-fall run
    pub min_duration_ms: u64,
    /// Maximum gap between the end of free fall and the impact
    pub impact_window_ms: u64,
}

impl Default for FreeFallConfig {
    fn default() -> Self {
        Self {
            max_magnitude: 2.0,
            min_duration_ms: 2_000,
            impact_window_ms: 1_000,
        }
    }
}

impl FreeFallConfig {
    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    pub fn impact_window(&self) -> Duration {
        Duration::from_millis(self.impact_window_ms)
    }
}

/// Fall detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Lower bound of the impact band (inclusive)
    pub impact_low: f64,
    /// Upper bound of the impact band (inclusive)
    pub impact_high: f64,
    /// Stabilization threshold (strict)
    pub stabilize_max: f64,
    /// Continuous stabilization required to count a fall (ms)
    pub stabilize_duration_ms: u64,
    /// Trailing window for the max-magnitude statistic (ms)
    pub window_duration_ms: u64,
    /// Eviction tick period (ms)
    pub eviction_interval_ms: u64,
    /// Requested sensor sampling period (ms)
    pub sample_interval_ms: u64,
    /// Free-fall precondition, disabled unless set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_fall: Option<FreeFallConfig>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            impact_low: DEFAULT_IMPACT_LOW,
            impact_high: DEFAULT_IMPACT_HIGH,
            stabilize_max: DEFAULT_STABILIZE_MAX,
            stabilize_duration_ms: DEFAULT_STABILIZE_DURATION_MS,
            window_duration_ms: DEFAULT_WINDOW_DURATION_MS,
            eviction_interval_ms: DEFAULT_EVICTION_INTERVAL_MS,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            free_fall: None,
        }
    }
}

impl DetectorConfig {
    /// Enable the free-fall precondition with the given parameters
    pub fn with_free_fall(mut self, free_fall: FreeFallConfig) -> Self {
        self.free_fall = Some(free_fall);
        self
    }

    pub fn stabilize_duration(&self) -> Duration {
        Duration::from_millis(self.stabilize_duration_ms)
    }

    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_duration_ms)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_millis(self.eviction_interval_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Upper bound on buffered samples between two eviction ticks.
    ///
    /// Sized for the window plus one tick at the nominal sampling rate, doubled
    /// to absorb sensors that deliver faster than requested.
    pub fn max_window_samples(&self) -> usize {
        let interval = self.sample_interval_ms.max(1);
        let span = self.window_duration_ms + self.eviction_interval_ms;
        ((span / interval + 1) * 2) as usize
    }

    /// Check that every threshold and period is usable
    pub fn validate(&self) -> Result<(), FallError> {
        let thresholds = [
            ("impact_low", self.impact_low),
            ("impact_high", self.impact_high),
            ("stabilize_max", self.stabilize_max),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(FallError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }

        if self.impact_low > self.impact_high {
            return Err(FallError::InvalidConfig(format!(
                "impact_low ({}) exceeds impact_high ({})",
                self.impact_low, self.impact_high
            )));
        }

        let periods = [
            ("stabilize_duration_ms", self.stabilize_duration_ms),
            ("window_duration_ms", self.window_duration_ms),
            ("eviction_interval_ms", self.eviction_interval_ms),
            ("sample_interval_ms", self.sample_interval_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(FallError::InvalidConfig(format!("{name} must be positive")));
            }
        }

        if let Some(free_fall) = &self.free_fall {
            if !free_fall.max_magnitude.is_finite() || free_fall.max_magnitude < 0.0 {
                return Err(FallError::InvalidConfig(format!(
                    "free_fall.max_magnitude must be a non-negative finite number, got {}",
                    free_fall.max_magnitude
                )));
            }
            if free_fall.min_duration_ms == 0 {
                return Err(FallError::InvalidConfig(
                    "free_fall.min_duration_ms must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Load configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, FallError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.impact_low, 6.0);
        assert_eq!(config.impact_high, 10.0);
        assert_eq!(config.stabilize_max, 2.0);
        assert_eq!(config.stabilize_duration(), Duration::from_secs(5));
        assert!(config.free_fall.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DetectorConfig::from_json(r#"{"impact_low": 5.5}"#).unwrap();
        assert_eq!(
            config,
            DetectorConfig {
                impact_low: 5.5,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_free_fall_section() {
        let config =
            DetectorConfig::from_json(r#"{"free_fall": {"min_duration_ms": 1500}}"#).unwrap();
        let free_fall = config.free_fall.unwrap();
        assert_eq!(free_fall.min_duration(), Duration::from_millis(1500));
        assert_eq!(free_fall.max_magnitude, 2.0);
        assert_eq!(free_fall.impact_window_ms, 1_000);
    }

    #[test]
    fn test_rejects_inverted_band() {
        let config = DetectorConfig {
            impact_low: 12.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FallError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_periods() {
        let config = DetectorConfig {
            eviction_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            stabilize_duration_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_threshold() {
        let config = DetectorConfig {
            stabilize_max: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = DetectorConfig::default().with_free_fall(FreeFallConfig::default());
        let json = config.to_json().unwrap();
        let loaded = DetectorConfig::from_json(&json).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_max_window_samples() {
        // (5000 + 1000) / 10 + 1 = 601, doubled
        assert_eq!(DetectorConfig::default().max_window_samples(), 1202);
    }
}
