//! Synheart Fall - On-device fall detection from accelerometer streams
//!
//! Fall turns a triaxial accelerometer stream into debounced fall counts and a
//! rolling maximum of acceleration magnitude through a deterministic pipeline:
//! magnitude reduction → trailing window statistic → impact/stabilization
//! phase detection → fall.event.v1 encoding.
//!
//! ## Modules
//!
//! - **Pipeline**: `FallProcessor` for per-reading ingestion, ticks and replay
//! - **Monitor**: live monitoring of a sensor source on a worker thread
//! - **Schema**: accel.sample.v1 input records
//! - **FFI**: C bindings for mobile hosts

pub mod config;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{DetectorConfig, FreeFallConfig};
pub use detector::FallPhaseDetector;
pub use encoder::FallEncoder;
pub use error::FallError;
pub use monitor::{
    AlertSink, DisplaySink, FallMonitor, SensorListener, SensorSource, SensorSubscription,
};
pub use pipeline::{samples_to_fall_events, FallProcessor};
pub use types::{AccelReading, FallEvent, FallRecord, FallSnapshot, Phase, PhaseState, Sample};
pub use window::WindowStats;

// Schema exports
pub use schema::{RawSample, SampleAdapter, SCHEMA_VERSION};

/// Fall version embedded in all output payloads
pub const FALL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for output payloads
pub const PRODUCER_NAME: &str = "synheart-fall";
