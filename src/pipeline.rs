//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Fall. A [`FallProcessor`]
//! owns one [`WindowStats`] and one [`FallPhaseDetector`] and is driven by two
//! inputs: accelerometer readings and the periodic eviction tick.
//!
//! Pipeline stages per reading:
//! 1. Sample - reduce the reading to its magnitude
//! 2. WindowStats - append to the trailing window
//! 3. FallPhaseDetector - run the phase transition check

use crate::config::DetectorConfig;
use crate::detector::FallPhaseDetector;
use crate::encoder::FallEncoder;
use crate::error::FallError;
use crate::schema::SampleAdapter;
use crate::types::{
    millis, AccelReading, FallEvent, FallRecord, FallSnapshot, Phase, Sample, WindowMaxUpdate,
};
use crate::window::WindowStats;
use std::time::Duration;
use tracing::warn;

/// Replay a recorded session and return the encoded fall events.
///
/// Eviction ticks are derived from the sample timestamps, so the same input
/// always yields the same events. Records that go back in time are dropped and
/// logged; the rest of the session is still processed.
///
/// # Arguments
/// * `samples_json` - JSON array of accel.sample.v1 records
/// * `device_id` - Device identifier for provenance
///
/// # Returns
/// Vector of fall.event.v1 JSON payloads (one per counted fall)
///
/// # Example
/// ```ignore
/// let events = samples_to_fall_events(samples_json, "watch-123".to_string())?;
/// ```
pub fn samples_to_fall_events(
    samples_json: String,
    device_id: String,
) -> Result<Vec<String>, FallError> {
    let samples = SampleAdapter::parse_array(&samples_json)?;
    let readings = SampleAdapter::to_replay_readings(&samples)?;

    let mut processor = FallProcessor::new();
    let encoder = FallEncoder::new(device_id);

    let records = processor.replay(&readings);
    if processor.dropped_samples() > 0 {
        warn!(
            dropped = processor.dropped_samples(),
            samples = readings.len(),
            "Replay dropped samples"
        );
    }

    records
        .iter()
        .filter(|record| matches!(record, FallRecord::Fall(_)))
        .map(|record| encoder.encode_to_json(record))
        .collect()
}

/// Stateful processor for a single accelerometer stream
#[derive(Debug, Clone)]
pub struct FallProcessor {
    config: DetectorConfig,
    window: WindowStats,
    detector: FallPhaseDetector,
    /// Timestamp of the last accepted sample
    last_timestamp: Option<Duration>,
    last_magnitude: f64,
    dropped_samples: u64,
    /// Next tick due in timestamp-driven replay
    next_tick: Option<Duration>,
}

impl Default for FallProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FallProcessor {
    /// Create a new processor with default thresholds
    pub fn new() -> Self {
        Self::build(DetectorConfig::default())
    }

    /// Create a processor with a specific configuration
    pub fn with_config(config: DetectorConfig) -> Result<Self, FallError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DetectorConfig) -> Self {
        Self {
            window: WindowStats::from_config(&config),
            detector: FallPhaseDetector::new(config.clone()),
            config,
            last_timestamp: None,
            last_magnitude: 0.0,
            dropped_samples: 0,
            next_tick: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Process one reading, returning the processing error if it was rejected.
    ///
    /// A rejected reading leaves the window and the detector untouched.
    pub fn try_ingest(&mut self, reading: &AccelReading) -> Result<Option<FallEvent>, FallError> {
        if let Some(last) = self.last_timestamp {
            if reading.timestamp < last {
                return Err(FallError::SampleProcessing(format!(
                    "timestamp {}ms precedes previous sample at {}ms",
                    millis(reading.timestamp),
                    millis(last)
                )));
            }
        }

        let sample = Sample::from_reading(reading)?;

        self.last_timestamp = Some(sample.timestamp);
        self.last_magnitude = sample.magnitude;
        self.window.record(sample);

        Ok(self.detector.process(&sample))
    }

    /// Process one reading. Rejected readings are logged, counted and dropped.
    pub fn ingest(&mut self, reading: &AccelReading) -> Option<FallEvent> {
        match self.try_ingest(reading) {
            Ok(event) => event,
            Err(e) => {
                self.record_dropped(&e);
                None
            }
        }
    }

    /// Account for a reading rejected by [`try_ingest`](FallProcessor::try_ingest)
    pub(crate) fn record_dropped(&mut self, error: &FallError) {
        self.dropped_samples += 1;
        warn!(error = %error, dropped = self.dropped_samples, "Dropping accelerometer sample");
    }

    /// Eviction tick: purge expired samples and recompute the window max
    pub fn tick(&mut self, now: Duration) -> WindowMaxUpdate {
        let max_magnitude = self.window.evict_expired(now);
        WindowMaxUpdate {
            at_ms: millis(now),
            max_magnitude,
            samples_in_window: self.window.len(),
        }
    }

    /// Process one reading with ticks driven by sample timestamps.
    ///
    /// Ticks fall every `eviction_interval` after the first reading; every tick
    /// due at or before this reading fires before it is ingested. Once a tick
    /// drains the window, the remaining due ticks collapse into one.
    pub fn advance(&mut self, reading: &AccelReading) -> Vec<FallRecord> {
        let interval = self.config.eviction_interval();
        let now = reading.timestamp;
        let mut next_tick = *self.next_tick.get_or_insert(now + interval);
        let mut records = Vec::new();

        while next_tick <= now {
            let update = self.tick(next_tick);
            let drained = update.samples_in_window == 0;
            records.push(FallRecord::WindowMax(update));
            next_tick += interval;

            if drained && next_tick <= now {
                let interval_ms = self.config.eviction_interval_ms;
                let skip_ms = (millis(now - next_tick) / interval_ms) * interval_ms;
                next_tick += Duration::from_millis(skip_ms);
            }
        }
        self.next_tick = Some(next_tick);

        if let Some(event) = self.ingest(reading) {
            records.push(FallRecord::Fall(event));
        }

        records
    }

    /// Replay a batch of readings through [`advance`](FallProcessor::advance)
    pub fn replay(&mut self, readings: &[AccelReading]) -> Vec<FallRecord> {
        readings
            .iter()
            .flat_map(|reading| self.advance(reading))
            .collect()
    }

    /// Current read-only view for display
    pub fn snapshot(&self) -> FallSnapshot {
        FallSnapshot {
            fall_count: self.detector.fall_count(),
            window_max: self.window.current_max(),
            last_magnitude: self.last_magnitude,
            phase: self.detector.phase(),
            samples_in_window: self.window.len(),
            dropped_samples: self.dropped_samples,
        }
    }

    pub fn fall_count(&self) -> u64 {
        self.detector.fall_count()
    }

    /// Window max as of the last tick
    pub fn window_max(&self) -> f64 {
        self.window.current_max()
    }

    pub fn phase(&self) -> Phase {
        self.detector.phase()
    }

    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples
    }

    /// Timestamp of the last accepted reading
    pub fn last_timestamp(&self) -> Option<Duration> {
        self.last_timestamp
    }
}
