//! Core types for the Synheart Fall pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw accelerometer readings, magnitude samples, detector phase
//! state, fall events, and the encoded output payload.
//!
//! Timestamps inside the engine are monotonic offsets (`Duration`) from the
//! start of a stream. They leave the engine as whole milliseconds.

use crate::error::FallError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Convert a monotonic offset to whole milliseconds
pub(crate) fn millis(timestamp: Duration) -> u64 {
    timestamp.as_millis() as u64
}

/// A single triaxial accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelReading {
    /// Monotonic offset from the start of the stream
    pub timestamp: Duration,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelReading {
    pub fn new(timestamp: Duration, x: f64, y: f64, z: f64) -> Self {
        Self { timestamp, x, y, z }
    }

    /// Create a reading stamped `t_ms` milliseconds into the stream
    pub fn from_millis(t_ms: u64, x: f64, y: f64, z: f64) -> Self {
        Self::new(Duration::from_millis(t_ms), x, y, z)
    }

    /// Euclidean norm of the acceleration vector
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Magnitude sample derived from an [`AccelReading`]. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Duration,
    pub magnitude: f64,
}

impl Sample {
    pub fn new(timestamp: Duration, magnitude: f64) -> Self {
        Self {
            timestamp,
            magnitude,
        }
    }

    /// Reduce a reading to its magnitude, rejecting non-finite input
    pub fn from_reading(reading: &AccelReading) -> Result<Self, FallError> {
        if !(reading.x.is_finite() && reading.y.is_finite() && reading.z.is_finite()) {
            return Err(FallError::SampleProcessing(format!(
                "non-finite axis value at {}ms: ({}, {}, {})",
                millis(reading.timestamp),
                reading.x,
                reading.y,
                reading.z
            )));
        }

        let magnitude = reading.magnitude();
        if !magnitude.is_finite() {
            return Err(FallError::SampleProcessing(format!(
                "magnitude overflow at {}ms",
                millis(reading.timestamp)
            )));
        }

        Ok(Self::new(reading.timestamp, magnitude))
    }
}

/// Detector phase, derived from [`PhaseState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No impact seen in the current cycle
    Idle,
    /// Impact latched, stabilization timer not running
    ImpactSeen,
    /// Impact latched and stabilization timer running
    Stabilizing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::ImpactSeen => "impact_seen",
            Phase::Stabilizing => "stabilizing",
        }
    }
}

/// Per-cycle detector state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseState {
    /// Impact latch, cleared only when a fall is counted
    pub impact_detected: bool,
    /// When the current stabilization run started, if one is running
    pub stabilization_start: Option<Duration>,
}

impl PhaseState {
    pub fn phase(&self) -> Phase {
        match (self.impact_detected, self.stabilization_start) {
            (false, _) => Phase::Idle,
            (true, None) => Phase::ImpactSeen,
            (true, Some(_)) => Phase::Stabilizing,
        }
    }
}

/// A counted fall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallEvent {
    /// Fall count after this event
    pub fall_count: u64,
    /// Timestamp of the sample that completed stabilization (ms)
    pub detected_at_ms: u64,
    /// Timestamp of the sample that latched the impact (ms)
    pub impact_at_ms: u64,
    /// Timestamp at which the completed stabilization run started (ms)
    pub stabilization_started_at_ms: u64,
    /// Magnitude of the sample that completed stabilization
    pub magnitude: f64,
}

/// Result of an eviction tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMaxUpdate {
    /// Tick time (ms)
    pub at_ms: u64,
    /// Maximum magnitude in the trailing window, 0 when empty
    pub max_magnitude: f64,
    /// Samples retained after eviction
    pub samples_in_window: usize,
}

/// Anything the pipeline reports downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FallRecord {
    Fall(FallEvent),
    WindowMax(WindowMaxUpdate),
}

/// Read-only view for the display layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallSnapshot {
    /// Falls counted so far (monotonic)
    pub fall_count: u64,
    /// Window max as of the last eviction tick
    pub window_max: f64,
    /// Magnitude of the most recent accepted sample
    pub last_magnitude: f64,
    /// Current detector phase
    pub phase: Phase,
    /// Samples currently buffered
    pub samples_in_window: usize,
    /// Readings rejected since start
    pub dropped_samples: u64,
}

impl Default for FallSnapshot {
    fn default() -> Self {
        Self {
            fall_count: 0,
            window_max: 0.0,
            last_magnitude: 0.0,
            phase: Phase::Idle,
            samples_in_window: 0,
            dropped_samples: 0,
        }
    }
}

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallProvenance {
    pub source_device_id: String,
    pub computed_at_utc: String,
}

/// Complete fall.event.v1 payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallPayload {
    pub schema_version: String,
    pub producer: FallProducer,
    pub provenance: FallProvenance,
    pub record: FallRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude() {
        let reading = AccelReading::from_millis(0, 3.0, 4.0, 12.0);
        assert!((reading.magnitude() - 13.0).abs() < 1e-12);

        let sample = Sample::from_reading(&reading).unwrap();
        assert_eq!(sample.timestamp, Duration::ZERO);
        assert!((sample.magnitude - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_finite_reading() {
        let reading = AccelReading::from_millis(10, f64::NAN, 0.0, 1.0);
        assert!(matches!(
            Sample::from_reading(&reading),
            Err(FallError::SampleProcessing(_))
        ));

        let reading = AccelReading::from_millis(10, f64::INFINITY, 0.0, 1.0);
        assert!(Sample::from_reading(&reading).is_err());
    }

    #[test]
    fn test_rejects_overflowing_magnitude() {
        let reading = AccelReading::from_millis(10, f64::MAX, f64::MAX, 0.0);
        assert!(Sample::from_reading(&reading).is_err());
    }

    #[test]
    fn test_phase_derivation() {
        assert_eq!(PhaseState::default().phase(), Phase::Idle);

        let latched = PhaseState {
            impact_detected: true,
            stabilization_start: None,
        };
        assert_eq!(latched.phase(), Phase::ImpactSeen);

        let stabilizing = PhaseState {
            impact_detected: true,
            stabilization_start: Some(Duration::from_secs(1)),
        };
        assert_eq!(stabilizing.phase(), Phase::Stabilizing);
    }

    #[test]
    fn test_record_tagging() {
        let record = FallRecord::WindowMax(WindowMaxUpdate {
            at_ms: 1000,
            max_magnitude: 9.0,
            samples_in_window: 3,
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "window_max");
        assert_eq!(value["max_magnitude"], 9.0);

        let parsed: FallRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }
}
