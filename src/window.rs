//! Rolling window statistic
//!
//! This module maintains a time-bounded buffer of recent magnitude samples and
//! reports the maximum magnitude in the trailing window. Eviction is lazy: the
//! ingestion path only appends, and expired samples are purged by the periodic
//! tick, which also recomputes the reported maximum.

use crate::config::DetectorConfig;
use crate::types::Sample;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Trailing-window max-magnitude statistic
#[derive(Debug, Clone)]
pub struct WindowStats {
    /// Buffered samples in arrival order
    samples: VecDeque<Sample>,
    /// Retention window
    window: Duration,
    /// Hard cap on buffered samples between ticks
    max_samples: usize,
    /// Maximum computed by the last eviction pass
    current_max: f64,
}

impl Default for WindowStats {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

impl WindowStats {
    /// Create a window statistic with the given retention and buffer cap
    pub fn new(window: Duration, max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            window,
            max_samples,
            current_max: 0.0,
        }
    }

    /// Create a window statistic sized for a detector configuration
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.window_duration(), config.max_window_samples())
    }

    /// Append a sample. Never evicts by age; that is left to [`evict_expired`].
    ///
    /// [`evict_expired`]: WindowStats::evict_expired
    pub fn record(&mut self, sample: Sample) {
        if self.samples.len() >= self.max_samples {
            // Only reachable when ticks stall or the sensor far outpaces its nominal rate
            debug!(
                max_samples = self.max_samples,
                "Window buffer full, dropping oldest sample"
            );
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Remove every sample older than the window relative to `now`, then
    /// recompute and return the maximum of what remains (0 when empty).
    pub fn evict_expired(&mut self, now: Duration) -> f64 {
        while let Some(oldest) = self.samples.front() {
            if now.saturating_sub(oldest.timestamp) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        self.current_max = Self::scan_max(&self.samples);
        self.current_max
    }

    /// Maximum as of the last eviction pass
    pub fn current_max(&self) -> f64 {
        self.current_max
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Retention window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop all samples and report zero
    pub fn clear(&mut self) {
        self.samples.clear();
        self.current_max = 0.0;
    }

    fn scan_max(samples: &VecDeque<Sample>) -> f64 {
        samples.iter().map(|s| s.magnitude).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64, magnitude: f64) -> Sample {
        Sample::new(Duration::from_millis(ms), magnitude)
    }

    #[test]
    fn test_reports_window_max() {
        let mut stats = WindowStats::default();
        stats.record(at(1000, 3.0));
        stats.record(at(2000, 9.0));
        stats.record(at(3000, 2.0));

        assert_eq!(stats.evict_expired(Duration::from_millis(4000)), 9.0);
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn test_reverts_to_zero_when_samples_age_out() {
        let mut stats = WindowStats::default();
        stats.record(at(1000, 3.0));
        stats.record(at(2000, 9.0));
        stats.record(at(3000, 2.0));

        assert_eq!(stats.evict_expired(Duration::from_millis(3000)), 9.0);
        // 9.0 leaves the window first
        assert_eq!(stats.evict_expired(Duration::from_millis(7001)), 2.0);
        assert_eq!(stats.evict_expired(Duration::from_millis(8001)), 0.0);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_empty_window_reports_zero() {
        let mut stats = WindowStats::default();
        assert_eq!(stats.current_max(), 0.0);
        assert_eq!(stats.evict_expired(Duration::from_secs(60)), 0.0);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let mut stats = WindowStats::default();
        stats.record(at(0, 4.0));

        // Exactly 5000ms old is still retained
        assert_eq!(stats.evict_expired(Duration::from_millis(5000)), 4.0);
        assert_eq!(stats.evict_expired(Duration::from_millis(5001)), 0.0);
    }

    #[test]
    fn test_eviction_is_idempotent() {
        let mut stats = WindowStats::default();
        for i in 0..20 {
            stats.record(at(i * 500, (i % 7) as f64));
        }

        let now = Duration::from_millis(10_000);
        let first = stats.evict_expired(now);
        let retained = stats.len();
        let second = stats.evict_expired(now);

        assert_eq!(first, second);
        assert_eq!(retained, stats.len());
    }

    #[test]
    fn test_record_does_not_evict() {
        let mut stats = WindowStats::default();
        stats.record(at(0, 8.0));
        stats.record(at(60_000, 1.0));

        assert_eq!(stats.len(), 2);
        // The reported value only changes on a tick
        assert_eq!(stats.current_max(), 0.0);
        assert_eq!(stats.evict_expired(Duration::from_millis(60_000)), 1.0);
        assert_eq!(stats.len(), 1);
    }

    #[test]
    fn test_never_reports_expired_contribution() {
        let mut stats = WindowStats::default();
        let mut now = 0;
        for i in 0..200u64 {
            let magnitude = if i % 37 == 0 { 9.5 } else { 1.0 };
            stats.record(at(i * 100, magnitude));
            if i % 10 == 0 {
                now = i * 100;
                let max = stats.evict_expired(Duration::from_millis(now));
                let expected = (0..=i)
                    .filter(|j| now - j * 100 <= 5000)
                    .map(|j| if j % 37 == 0 { 9.5 } else { 1.0 })
                    .fold(0.0, f64::max);
                assert_eq!(max, expected, "tick at {now}ms");
            }
        }
        assert!(now > 0);
    }

    #[test]
    fn test_buffer_cap_drops_oldest() {
        let mut stats = WindowStats::new(Duration::from_secs(5), 3);
        stats.record(at(0, 9.0));
        stats.record(at(10, 1.0));
        stats.record(at(20, 1.0));
        stats.record(at(30, 2.0));

        assert_eq!(stats.len(), 3);
        assert_eq!(stats.evict_expired(Duration::from_millis(30)), 2.0);
    }

    #[test]
    fn test_clear() {
        let mut stats = WindowStats::default();
        stats.record(at(0, 7.0));
        stats.evict_expired(Duration::ZERO);
        stats.clear();

        assert!(stats.is_empty());
        assert_eq!(stats.current_max(), 0.0);
    }
}
