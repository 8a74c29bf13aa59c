//! Adapter for converting accel.sample.v1 records to engine readings
//!
//! Handles batch parsing (JSON array or NDJSON), batch validation including
//! timestamp ordering, and conversion to [`AccelReading`]s.

use crate::error::FallError;
use crate::schema::raw_sample::*;
use crate::types::AccelReading;

/// Adapter for converting raw samples to readings
pub struct SampleAdapter;

impl SampleAdapter {
    /// Parse a JSON string containing an array of RawSamples
    pub fn parse_array(json: &str) -> Result<Vec<RawSample>, FallError> {
        let samples: Vec<RawSample> = serde_json::from_str(json)?;
        Ok(samples)
    }

    /// Parse NDJSON (newline-delimited JSON) containing RawSamples
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawSample>, FallError> {
        let mut samples = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawSample>(trimmed) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    return Err(FallError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(samples)
    }

    /// Convert validated samples to readings, failing on the first bad record
    pub fn to_readings(samples: &[RawSample]) -> Result<Vec<AccelReading>, FallError> {
        if let Some(invalid) = Self::validate_samples(samples).into_iter().next() {
            return Err(FallError::ParseError(format!(
                "Invalid sample at index {}: {}",
                invalid.index, invalid.error
            )));
        }

        Ok(samples.iter().map(RawSample::to_reading).collect())
    }

    /// Convert samples for replay, failing only on records from a foreign schema.
    ///
    /// Ordering is left to the processor, which drops readings that go back
    /// in time and keeps going.
    pub fn to_replay_readings(samples: &[RawSample]) -> Result<Vec<AccelReading>, FallError> {
        samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                if sample.schema_version != SCHEMA_VERSION {
                    return Err(FallError::ParseError(format!(
                        "Invalid sample at index {}: {}",
                        index,
                        ValidationError::InvalidSchemaVersion {
                            expected: SCHEMA_VERSION.to_string(),
                            actual: sample.schema_version.clone(),
                        }
                    )));
                }
                Ok(sample.to_reading())
            })
            .collect()
    }

    /// Validate a batch of samples, returning one entry per invalid record
    pub fn validate_samples(samples: &[RawSample]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous_t_ms: Option<u64> = None;

        for (index, sample) in samples.iter().enumerate() {
            let error = match sample.validate() {
                Err(e) => Some(e),
                Ok(()) => match previous_t_ms {
                    Some(previous) if sample.t_ms < previous => {
                        Some(ValidationError::TimestampRegression {
                            previous,
                            actual: sample.t_ms,
                        })
                    }
                    _ => {
                        previous_t_ms = Some(sample.t_ms);
                        None
                    }
                },
            };

            if let Some(error) = error {
                results.push(ValidationResult {
                    index,
                    event_id: sample.event_id.clone(),
                    error,
                });
            }
        }

        results
    }
}

/// An invalid record found during batch validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub event_id: Option<String>,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    const NDJSON: &str = r#"
{"t_ms": 0, "x": 0.0, "y": 0.0, "z": 1.0}
{"t_ms": 10, "x": 0.0, "y": 0.5, "z": 1.0}

{"t_ms": 20, "x": 3.0, "y": 4.0, "z": 0.0, "event_id": "s-3"}
"#;

    #[test]
    fn test_parse_ndjson() {
        let samples = SampleAdapter::parse_ndjson(NDJSON).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].event_id.as_deref(), Some("s-3"));
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"t_ms\": 0, \"x\": 0, \"y\": 0, \"z\": 1}\nnot json";
        let err = SampleAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let samples = SampleAdapter::parse_array(
            r#"[{"t_ms": 0, "x": 0, "y": 0, "z": 1}, {"t_ms": 5, "x": 0, "y": 0, "z": 2}]"#,
        )
        .unwrap();
        assert_eq!(samples.len(), 2);
        assert!(SampleAdapter::parse_array("{}").is_err());
    }

    #[test]
    fn test_to_readings() {
        let samples = SampleAdapter::parse_ndjson(NDJSON).unwrap();
        let readings = SampleAdapter::to_readings(&samples).unwrap();

        assert_eq!(readings.len(), 3);
        assert!((readings[2].magnitude() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_samples_flags_regression() {
        let samples = vec![
            RawSample::new(100, 0.0, 0.0, 1.0),
            RawSample::new(50, 0.0, 0.0, 1.0),
            RawSample::new(100, 0.0, 0.0, 1.0),
            RawSample::new(200, f64::INFINITY, 0.0, 1.0),
            RawSample::new(150, 0.0, 0.0, 1.0),
        ];

        let results = SampleAdapter::validate_samples(&samples);
        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();

        // Equal timestamps are fine; the rejected record does not advance the clock
        assert_eq!(indices, vec![1, 3]);
        assert!(matches!(
            results[0].error,
            ValidationError::TimestampRegression { previous: 100, actual: 50 }
        ));
        assert!(SampleAdapter::to_readings(&samples).is_err());
    }

    #[test]
    fn test_replay_readings_keep_out_of_order_records() {
        let samples = vec![
            RawSample::new(100, 0.0, 0.0, 1.0),
            RawSample::new(50, 0.0, 0.0, 2.0),
            RawSample::new(200, 0.0, 0.0, 3.0),
        ];

        let readings = SampleAdapter::to_replay_readings(&samples).unwrap();
        let t_ms: Vec<u64> = readings.iter().map(|r| r.timestamp.as_millis() as u64).collect();
        assert_eq!(t_ms, vec![100, 50, 200]);
    }

    #[test]
    fn test_replay_readings_reject_foreign_schema() {
        let mut samples = vec![RawSample::new(0, 0.0, 0.0, 1.0)];
        samples.push(RawSample {
            schema_version: "wear.raw_event.v1".to_string(),
            ..RawSample::new(10, 0.0, 0.0, 1.0)
        });

        let err = SampleAdapter::to_replay_readings(&samples).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }
}
