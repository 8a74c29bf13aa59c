//! Unified accel.sample.v1 schema
//!
//! This module defines the input schema for accelerometer streams and the
//! adapter that turns batches of records into engine readings.

mod adapter;
mod raw_sample;

pub use adapter::*;
pub use raw_sample::*;
