//! Fall phase detection
//!
//! A per-sample state machine that turns the magnitude stream into debounced
//! fall counts:
//!
//! 1. **Impact** - the first sample inside `[impact_low, impact_high]` latches
//!    the impact. The latch is not re-armed until a fall is counted.
//! 2. **Stabilization** - while latched, a sample strictly below
//!    `stabilize_max` starts the debounce timer if it is not running; any
//!    other sample clears the timer (the latch is kept).
//! 3. **Count** - a qualifying sample arriving `stabilize_duration` or more
//!    after the timer started counts a fall and resets the cycle.
//!
//! The impact check runs before the stabilization check, so one sample can
//! both latch an impact and start the timer.

use crate::config::{DetectorConfig, FreeFallConfig};
use crate::types::{millis, FallEvent, Phase, PhaseState, Sample};
use std::time::Duration;
use tracing::{debug, info};

/// Stateful fall classifier over magnitude samples
#[derive(Debug, Clone)]
pub struct FallPhaseDetector {
    config: DetectorConfig,
    state: PhaseState,
    fall_count: u64,
    /// When the current impact latched
    impact_at: Option<Duration>,
    /// Start of the free-fall run in progress
    free_fall_start: Option<Duration>,
    /// End of the last free-fall run long enough to arm the impact latch
    free_fall_end: Option<Duration>,
}

impl Default for FallPhaseDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl FallPhaseDetector {
    /// Create a detector. The configuration is expected to be validated.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            state: PhaseState::default(),
            fall_count: 0,
            impact_at: None,
            free_fall_start: None,
            free_fall_end: None,
        }
    }

    /// Feed one sample. Returns the fall event if this sample completed one.
    pub fn process(&mut self, sample: &Sample) -> Option<FallEvent> {
        let now = sample.timestamp;
        let magnitude = sample.magnitude;

        if let Some(free_fall) = self.config.free_fall {
            self.track_free_fall(free_fall, sample);
        }

        if !self.state.impact_detected
            && self.in_impact_band(magnitude)
            && self.free_fall_armed(now)
        {
            self.state.impact_detected = true;
            self.impact_at = Some(now);
            debug!(magnitude, at_ms = millis(now), "Impact phase detected");
        }

        if self.state.impact_detected && magnitude < self.config.stabilize_max {
            match self.state.stabilization_start {
                None => {
                    self.state.stabilization_start = Some(now);
                    debug!(at_ms = millis(now), "Stabilization timer started");
                }
                Some(start) if now.saturating_sub(start) >= self.config.stabilize_duration() => {
                    return Some(self.count_fall(sample, start));
                }
                Some(_) => {}
            }
        } else if let Some(start) = self.state.stabilization_start.take() {
            debug!(
                magnitude,
                started_at_ms = millis(start),
                at_ms = millis(now),
                "Stabilization interrupted, timer reset"
            );
        }

        None
    }

    /// Current per-cycle state
    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Falls counted so far
    pub fn fall_count(&self) -> u64 {
        self.fall_count
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn in_impact_band(&self, magnitude: f64) -> bool {
        magnitude >= self.config.impact_low && magnitude <= self.config.impact_high
    }

    fn track_free_fall(&mut self, free_fall: FreeFallConfig, sample: &Sample) {
        let now = sample.timestamp;
        if sample.magnitude < free_fall.max_magnitude {
            self.free_fall_start.get_or_insert(now);
        } else if let Some(start) = self.free_fall_start.take() {
            if now.saturating_sub(start) >= free_fall.min_duration() {
                self.free_fall_end = Some(now);
                debug!(
                    started_at_ms = millis(start),
                    at_ms = millis(now),
                    "Free-fall phase detected"
                );
            }
        }
    }

    fn free_fall_armed(&self, now: Duration) -> bool {
        match &self.config.free_fall {
            None => true,
            Some(free_fall) => self
                .free_fall_end
                .map_or(false, |end| now.saturating_sub(end) <= free_fall.impact_window()),
        }
    }

    fn count_fall(&mut self, sample: &Sample, stabilization_start: Duration) -> FallEvent {
        self.fall_count += 1;

        let event = FallEvent {
            fall_count: self.fall_count,
            detected_at_ms: millis(sample.timestamp),
            impact_at_ms: millis(self.impact_at.unwrap_or(stabilization_start)),
            stabilization_started_at_ms: millis(stabilization_start),
            magnitude: sample.magnitude,
        };

        info!(
            fall_count = event.fall_count,
            impact_at_ms = event.impact_at_ms,
            detected_at_ms = event.detected_at_ms,
            "Fall detected and counted"
        );

        self.reset_cycle();
        event
    }

    fn reset_cycle(&mut self) {
        self.state = PhaseState::default();
        self.impact_at = None;
        self.free_fall_start = None;
        self.free_fall_end = None;
    }
}
