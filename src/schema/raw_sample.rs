//! accel.sample.v1 schema definition
//!
//! One record per accelerometer reading. `t_ms` is a monotonic offset from the
//! start of the recording, not wall-clock time.

use crate::types::AccelReading;
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "accel.sample.v1";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// A single raw accelerometer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Schema version identifier (defaults to the current version)
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Unique sample identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Monotonic timestamp in milliseconds
    pub t_ms: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Originating device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl RawSample {
    /// Create a new sample record
    pub fn new(t_ms: u64, x: f64, y: f64, z: f64) -> Self {
        RawSample {
            schema_version: SCHEMA_VERSION.to_string(),
            event_id: Some(uuid::Uuid::new_v4().to_string()),
            t_ms,
            x,
            y,
            z,
            device_id: None,
        }
    }

    /// Attach the originating device
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Validate the record on its own (ordering is checked per batch)
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        for (axis, value) in [("x", self.x), ("y", self.y), ("z", self.z)] {
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteAxis {
                    axis: axis.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }

    /// Convert to an engine reading
    pub fn to_reading(&self) -> AccelReading {
        AccelReading::from_millis(self.t_ms, self.x, self.y, self.z)
    }
}

/// Validation errors for raw samples
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Non-finite {axis} axis value: {value}")]
    NonFiniteAxis { axis: String, value: f64 },

    #[error("Timestamp went backwards: {actual}ms after {previous}ms")]
    TimestampRegression { previous: u64, actual: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_serialize_sample() {
        let sample = RawSample::new(1500, 0.1, -0.2, 9.8).with_device_id("watch-1");
        let json = serde_json::to_string(&sample).unwrap();

        assert!(json.contains("accel.sample.v1"));
        assert!(json.contains("\"t_ms\":1500"));
        assert!(json.contains("watch-1"));
    }

    #[test]
    fn test_deserialize_minimal_sample() {
        let sample: RawSample =
            serde_json::from_str(r#"{"t_ms": 20, "x": 1.0, "y": 2.0, "z": 2.0}"#).unwrap();

        assert_eq!(sample.schema_version, SCHEMA_VERSION);
        assert!(sample.event_id.is_none());
        assert!(sample.validate().is_ok());

        let reading = sample.to_reading();
        assert_eq!(reading.timestamp, Duration::from_millis(20));
        assert!((reading.magnitude() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_foreign_schema() {
        let sample: RawSample = serde_json::from_str(
            r#"{"schema_version": "wear.raw_event.v1", "t_ms": 0, "x": 0, "y": 0, "z": 1}"#,
        )
        .unwrap();

        assert!(matches!(
            sample.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite_axis() {
        let sample = RawSample::new(0, 0.0, f64::NAN, 1.0);
        match sample.validate() {
            Err(ValidationError::NonFiniteAxis { axis, .. }) => assert_eq!(axis, "y"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_axis_fails_to_parse() {
        let result = serde_json::from_str::<RawSample>(r#"{"t_ms": 0, "x": 1.0, "y": 1.0}"#);
        assert!(result.is_err());
    }
}
