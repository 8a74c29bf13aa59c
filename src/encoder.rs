//! fall.event.v1 encoding
//!
//! Wraps pipeline records with producer and provenance metadata so downstream
//! consumers can tell which engine instance and device produced them.

use crate::error::FallError;
use crate::types::{FallPayload, FallProducer, FallProvenance, FallRecord};
use crate::{FALL_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current output schema version
pub const OUTPUT_SCHEMA_VERSION: &str = "fall.event.v1";

/// Encoder for fall.event.v1 payloads
#[derive(Debug, Clone)]
pub struct FallEncoder {
    instance_id: String,
    device_id: String,
}

impl FallEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            device_id: device_id.into(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            device_id: device_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a record into a payload
    pub fn encode(&self, record: &FallRecord) -> FallPayload {
        FallPayload {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            producer: FallProducer {
                name: PRODUCER_NAME.to_string(),
                version: FALL_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: FallProvenance {
                source_device_id: self.device_id.clone(),
                computed_at_utc: Utc::now().to_rfc3339(),
            },
            record: record.clone(),
        }
    }

    /// Encode to a single-line JSON string
    pub fn encode_to_json(&self, record: &FallRecord) -> Result<String, FallError> {
        let payload = self.encode(record);
        serde_json::to_string(&payload).map_err(|e| FallError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FallEvent, WindowMaxUpdate};
    use pretty_assertions::assert_eq;

    fn fall_record() -> FallRecord {
        FallRecord::Fall(FallEvent {
            fall_count: 2,
            detected_at_ms: 9000,
            impact_at_ms: 0,
            stabilization_started_at_ms: 4000,
            magnitude: 1.0,
        })
    }

    #[test]
    fn test_encode_fall() {
        let encoder = FallEncoder::with_instance_id("instance-1", "watch-7");
        let payload = encoder.encode(&fall_record());

        assert_eq!(payload.schema_version, OUTPUT_SCHEMA_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.version, FALL_VERSION);
        assert_eq!(payload.producer.instance_id, "instance-1");
        assert_eq!(payload.provenance.source_device_id, "watch-7");
        assert!(chrono::DateTime::parse_from_rfc3339(&payload.provenance.computed_at_utc).is_ok());
        assert_eq!(payload.record, fall_record());
    }

    #[test]
    fn test_encode_to_json_is_single_line() {
        let encoder = FallEncoder::new("watch-7");
        let json = encoder
            .encode_to_json(&FallRecord::WindowMax(WindowMaxUpdate {
                at_ms: 3000,
                max_magnitude: 8.5,
                samples_in_window: 40,
            }))
            .unwrap();

        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["record"]["type"], "window_max");
        assert_eq!(value["record"]["max_magnitude"], 8.5);
        assert_eq!(value["producer"]["instance_id"], encoder.instance_id());
    }

    #[test]
    fn test_instances_differ() {
        assert_ne!(
            FallEncoder::new("a").instance_id(),
            FallEncoder::new("a").instance_id()
        );
    }
}
