//! FFI bindings for Synheart Fall
//!
//! This module provides C-compatible functions for embedding the detector in a
//! mobile host. The host owns the sensor subscription and the eviction timer and
//! drives a processor handle through `fall_processor_ingest` and
//! `fall_processor_tick`. Strings returned by these functions are allocated and
//! must be freed by the caller using `fall_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::time::Duration;

use crate::config::DetectorConfig;
use crate::pipeline::{samples_to_fall_events, FallProcessor};
use crate::types::AccelReading;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Helper to convert a Vec<String> to a JSON array string
fn vec_to_json_array(vec: Vec<String>) -> String {
    // Each string is already valid JSON, so we join them as array elements
    format!("[{}]", vec.join(","))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Replay a JSON array of accel.sample.v1 records and return the fall.event.v1
/// payloads as a JSON array.
///
/// # Safety
/// - `json` and `device_id` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `fall_free_string`.
/// - Returns NULL on error; call `fall_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fall_samples_to_events(
    json: *const c_char,
    device_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let device_str = match cstr_to_string(device_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid device_id string pointer");
            return ptr::null_mut();
        }
    };

    match samples_to_fall_events(json_str, device_str) {
        Ok(payloads) => string_to_cstr(&vec_to_json_array(payloads)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a FallProcessor
pub struct FallProcessorHandle {
    processor: FallProcessor,
}

/// Create a new FallProcessor.
///
/// # Safety
/// - `config_json` must be NULL (defaults) or a valid null-terminated C string
///   holding a JSON detector configuration.
/// - Returns a pointer to a newly allocated FallProcessor.
/// - Must be freed with `fall_processor_free`.
/// - Returns NULL on error; call `fall_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fall_processor_new(
    config_json: *const c_char,
) -> *mut FallProcessorHandle {
    clear_last_error();

    let processor = if config_json.is_null() {
        FallProcessor::new()
    } else {
        let json_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };

        match DetectorConfig::from_json(&json_str).and_then(FallProcessor::with_config) {
            Ok(processor) => processor,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(FallProcessorHandle { processor }))
}

/// Free a FallProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fall_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fall_processor_free(processor: *mut FallProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Feed one accelerometer reading.
///
/// `t_ms` is the reading's monotonic timestamp in milliseconds.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fall_processor_new`.
/// - Returns 1 if the reading completed a fall, 0 if not, and -1 if the
///   reading was dropped (call `fall_last_error` for the reason).
#[no_mangle]
pub unsafe extern "C" fn fall_processor_ingest(
    processor: *mut FallProcessorHandle,
    t_ms: u64,
    x: f64,
    y: f64,
    z: f64,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;
    let reading = AccelReading::from_millis(t_ms, x, y, z);

    match handle.processor.try_ingest(&reading) {
        Ok(Some(_)) => 1,
        Ok(None) => 0,
        Err(e) => {
            handle.processor.record_dropped(&e);
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Run the eviction tick and return the window max.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fall_processor_new`.
/// - Returns the maximum magnitude in the trailing window (0 when empty), or
///   -1 on a NULL processor.
#[no_mangle]
pub unsafe extern "C" fn fall_processor_tick(
    processor: *mut FallProcessorHandle,
    now_ms: u64,
) -> f64 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1.0;
    }

    let handle = &mut *processor;
    handle
        .processor
        .tick(Duration::from_millis(now_ms))
        .max_magnitude
}

/// Number of falls counted so far.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fall_processor_new`.
/// - Returns -1 on a NULL processor.
#[no_mangle]
pub unsafe extern "C" fn fall_processor_fall_count(processor: *const FallProcessorHandle) -> i64 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    (*processor).processor.fall_count() as i64
}

/// Current processor snapshot as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fall_processor_new`.
/// - Returns a newly allocated string that must be freed with `fall_free_string`.
/// - Returns NULL on error; call `fall_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fall_processor_snapshot(
    processor: *const FallProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    match serde_json::to_string(&(*processor).processor.snapshot()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Fall functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Fall function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fall_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Fall function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn fall_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn fall_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_session_json() -> CString {
        let mut samples = Vec::new();
        for (i, z) in [7.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0].iter().enumerate() {
            samples.push(format!(
                r#"{{"t_ms": {}, "x": 0.0, "y": 0.0, "z": {}}}"#,
                i * 1000,
                z
            ));
        }
        CString::new(format!("[{}]", samples.join(","))).unwrap()
    }

    #[test]
    fn test_ffi_samples_to_events() {
        let json = sample_session_json();
        let device = CString::new("test-device").unwrap();

        unsafe {
            let result = fall_samples_to_events(json.as_ptr(), device.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let payloads: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(payloads.as_array().unwrap().len(), 1);
            assert_eq!(payloads[0]["schema_version"], "fall.event.v1");
            assert_eq!(payloads[0]["record"]["detected_at_ms"], 6000);

            fall_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = fall_processor_new(ptr::null());
            assert!(!processor.is_null());

            assert_eq!(fall_processor_ingest(processor, 0, 0.0, 0.0, 7.0), 0);
            for t in 1..6 {
                assert_eq!(fall_processor_ingest(processor, t * 1000, 0.0, 0.0, 1.0), 0);
            }
            assert_eq!(fall_processor_ingest(processor, 6000, 0.0, 0.0, 1.0), 1);
            assert_eq!(fall_processor_fall_count(processor), 1);

            assert_eq!(fall_processor_tick(processor, 7000), 1.0);
            assert_eq!(fall_processor_tick(processor, 60_000), 0.0);

            let snapshot = fall_processor_snapshot(processor);
            assert!(!snapshot.is_null());
            let snapshot_str = CStr::from_ptr(snapshot).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(snapshot_str).unwrap();
            assert_eq!(value["fall_count"], 1);
            assert_eq!(value["phase"], "idle");
            assert_eq!(value["window_max"], 0.0);

            fall_free_string(snapshot);
            fall_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_processor_with_config() {
        let config = CString::new(r#"{"stabilize_duration_ms": 1000}"#).unwrap();

        unsafe {
            let processor = fall_processor_new(config.as_ptr());
            assert!(!processor.is_null());

            fall_processor_ingest(processor, 0, 0.0, 0.0, 8.0);
            fall_processor_ingest(processor, 100, 0.0, 0.0, 1.0);
            assert_eq!(fall_processor_ingest(processor, 1100, 0.0, 0.0, 1.0), 1);

            fall_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_rejects_invalid_config() {
        let config = CString::new(r#"{"impact_low": 20.0}"#).unwrap();

        unsafe {
            let processor = fall_processor_new(config.as_ptr());
            assert!(processor.is_null());

            let error = fall_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("impact_low"));
        }
    }

    #[test]
    fn test_ffi_dropped_sample() {
        unsafe {
            let processor = fall_processor_new(ptr::null());

            assert_eq!(fall_processor_ingest(processor, 1000, 0.0, 0.0, 1.0), 0);
            assert_eq!(fall_processor_ingest(processor, 500, 0.0, 0.0, 1.0), -1);
            assert!(!fall_last_error().is_null());

            assert_eq!(fall_processor_ingest(processor, 2000, f64::NAN, 0.0, 1.0), -1);
            assert_eq!((*processor).processor.dropped_samples(), 2);

            // A successful call clears the error
            assert_eq!(fall_processor_ingest(processor, 3000, 0.0, 0.0, 1.0), 0);
            assert!(fall_last_error().is_null());

            fall_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let device = CString::new("device").unwrap();

            let result = fall_samples_to_events(invalid_json.as_ptr(), device.as_ptr());
            assert!(result.is_null());

            let error = fall_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            assert_eq!(fall_processor_ingest(ptr::null_mut(), 0, 0.0, 0.0, 1.0), -1);
            assert_eq!(fall_processor_fall_count(ptr::null()), -1);
            assert!(fall_processor_snapshot(ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = fall_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::FALL_VERSION);
        }
    }
}
