//! Error types for Synheart Fall

use thiserror::Error;

/// Errors that can occur while detecting falls
#[derive(Debug, Error)]
pub enum FallError {
    #[error("Accelerometer not available on this device")]
    SensorUnavailable,

    #[error("Failed to subscribe to accelerometer data: {0}")]
    Subscription(String),

    #[error("Error processing accelerometer sample: {0}")]
    SampleProcessing(String),

    #[error("Monitor is already running")]
    AlreadyRunning,

    #[error("Invalid detector configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse sample payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
