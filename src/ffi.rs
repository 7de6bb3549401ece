//! FFI bindings for WellMind Vision
//!
//! This module provides C-compatible functions for calling the decision
//! pipeline from other languages. Inputs are `wellmind.detections.v1` JSON
//! records; outputs are response envelope JSON. All returned strings are
//! allocated and must be freed by the caller using `wellmind_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::PipelineConfig;
use crate::detector::ModelInfo;
use crate::encoder::{to_json, ResponseEncoder};
use crate::error::VisionError;
use crate::pipeline::DecisionPipeline;
use crate::schema::EvidenceAdapter;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

#[derive(Debug, Clone, Copy)]
enum Operation {
    AnalyzeEmotion,
    WellnessScore,
    DetectFaces,
    AnalyzeSimple,
}

/// Run one operation on a detection record and encode the envelope
fn respond(
    pipeline: &DecisionPipeline,
    encoder: &ResponseEncoder,
    operation: Operation,
    json: &str,
) -> Result<String, VisionError> {
    let record = EvidenceAdapter::parse_record(json)?;
    let evidence = EvidenceAdapter::record_to_evidence(&record)?;
    let models = ModelInfo::replay();

    match operation {
        Operation::AnalyzeEmotion => {
            let analysis = pipeline.analyze_emotion(&evidence)?;
            to_json(&encoder.emotion_analysis(analysis, &models))
        }
        Operation::WellnessScore => to_json(&encoder.wellness_score(pipeline.wellness_score(&evidence)?)),
        Operation::DetectFaces => {
            to_json(&encoder.face_analysis(pipeline.detect_faces(&evidence), &models))
        }
        Operation::AnalyzeSimple => to_json(&encoder.simple_mood(pipeline.analyze_simple(&evidence)?)),
    }
}

/// Shared body of every JSON-in/JSON-out entry point
unsafe fn run(
    pipeline: &DecisionPipeline,
    encoder: &ResponseEncoder,
    operation: Operation,
    json: *const c_char,
) -> *mut c_char {
    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match respond(pipeline, encoder, operation, &json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze emotion for the most confident face in a detection record.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellmind_free_string`.
/// - Returns NULL on error; call `wellmind_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellmind_analyze_emotion(json: *const c_char) -> *mut c_char {
    clear_last_error();
    run(
        &DecisionPipeline::default(),
        &ResponseEncoder::new(),
        Operation::AnalyzeEmotion,
        json,
    )
}

/// Compute the wellness score for the most confident face in a detection record.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellmind_free_string`.
/// - Returns NULL on error; call `wellmind_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellmind_wellness_score(json: *const c_char) -> *mut c_char {
    clear_last_error();
    run(
        &DecisionPipeline::default(),
        &ResponseEncoder::new(),
        Operation::WellnessScore,
        json,
    )
}

/// Summarize every face in a detection record. Zero faces is not an error.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellmind_free_string`.
/// - Returns NULL on error; call `wellmind_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellmind_detect_faces(json: *const c_char) -> *mut c_char {
    clear_last_error();
    run(
        &DecisionPipeline::default(),
        &ResponseEncoder::new(),
        Operation::DetectFaces,
        json,
    )
}

/// Estimate mood from landmark geometry of the most confident face.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellmind_free_string`.
/// - Returns NULL on error; call `wellmind_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellmind_analyze_simple(json: *const c_char) -> *mut c_char {
    clear_last_error();
    run(
        &DecisionPipeline::default(),
        &ResponseEncoder::new(),
        Operation::AnalyzeSimple,
        json,
    )
}

// ============================================================================
// Configured Pipeline API
// ============================================================================

/// Opaque handle to a configured pipeline
pub struct WellmindPipelineHandle {
    pipeline: DecisionPipeline,
    encoder: ResponseEncoder,
}

/// Create a pipeline from a `PipelineConfig` JSON document.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL for defaults.
/// - Returns a pointer that must be freed with `wellmind_pipeline_free`.
/// - Returns NULL on error; call `wellmind_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellmind_pipeline_new(
    config_json: *const c_char,
) -> *mut WellmindPipelineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        PipelineConfig::default()
    } else {
        let json_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match PipelineConfig::from_json(&json_str) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(WellmindPipelineHandle {
        pipeline: DecisionPipeline::from_config(&config),
        encoder: ResponseEncoder::new(),
    });
    Box::into_raw(handle)
}

/// Free a pipeline.
///
/// # Safety
/// - `pipeline` must be a valid pointer returned by `wellmind_pipeline_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellmind_pipeline_free(pipeline: *mut WellmindPipelineHandle) {
    if !pipeline.is_null() {
        drop(Box::from_raw(pipeline));
    }
}

unsafe fn run_with_handle(
    pipeline: *const WellmindPipelineHandle,
    operation: Operation,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if pipeline.is_null() {
        set_last_error("Null pipeline pointer");
        return ptr::null_mut();
    }

    let handle = &*pipeline;
    run(&handle.pipeline, &handle.encoder, operation, json)
}

/// Analyze emotion with a configured pipeline.
///
/// # Safety
/// - `pipeline` must be a valid pointer returned by `wellmind_pipeline_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellmind_free_string`.
/// - Returns NULL on error; call `wellmind_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellmind_pipeline_analyze_emotion(
    pipeline: *const WellmindPipelineHandle,
    json: *const c_char,
) -> *mut c_char {
    run_with_handle(pipeline, Operation::AnalyzeEmotion, json)
}

/// Compute the wellness score with a configured pipeline.
///
/// # Safety
/// Same contract as `wellmind_pipeline_analyze_emotion`.
#[no_mangle]
pub unsafe extern "C" fn wellmind_pipeline_wellness_score(
    pipeline: *const WellmindPipelineHandle,
    json: *const c_char,
) -> *mut c_char {
    run_with_handle(pipeline, Operation::WellnessScore, json)
}

/// Summarize every face with a configured pipeline.
///
/// # Safety
/// Same contract as `wellmind_pipeline_analyze_emotion`.
#[no_mangle]
pub unsafe extern "C" fn wellmind_pipeline_detect_faces(
    pipeline: *const WellmindPipelineHandle,
    json: *const c_char,
) -> *mut c_char {
    run_with_handle(pipeline, Operation::DetectFaces, json)
}

/// Estimate mood from landmark geometry with a configured pipeline.
///
/// # Safety
/// Same contract as `wellmind_pipeline_analyze_emotion`.
#[no_mangle]
pub unsafe extern "C" fn wellmind_pipeline_analyze_simple(
    pipeline: *const WellmindPipelineHandle,
    json: *const c_char,
) -> *mut c_char {
    run_with_handle(pipeline, Operation::AnalyzeSimple, json)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by WellMind functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a WellMind function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellmind_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next WellMind function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn wellmind_last_error() -> *const c_char {
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
pub unsafe extern "C" fn wellmind_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record_json() -> CString {
        CString::new(
            r#"{
                "schema_version": "wellmind.detections.v1",
                "faces": [{
                    "box": [20, 30, 110, 130],
                    "confidence": 0.96,
                    "keypoints": {
                        "left_eye": [50, 70], "right_eye": [100, 70], "nose": [75, 95],
                        "mouth_left": [55, 120], "mouth_right": [95, 121]
                    },
                    "emotion": {"angry": 85.0, "neutral": 10.0, "sad": 5.0}
                }]
            }"#,
        )
        .unwrap()
    }

    unsafe fn take_json(result: *mut c_char) -> serde_json::Value {
        assert!(!result.is_null());
        let value = serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
        wellmind_free_string(result);
        value
    }

    #[test]
    fn test_ffi_analyze_emotion() {
        let json = sample_record_json();
        unsafe {
            let value = take_json(wellmind_analyze_emotion(json.as_ptr()));
            assert_eq!(value["dominant_emotion"], "angry");
            assert_eq!(value["stress_level"], "High");
            assert!(value["producer"]["instance_id"].is_string());
            assert!(wellmind_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_stateless_operations() {
        let json = sample_record_json();
        unsafe {
            let value = take_json(wellmind_wellness_score(json.as_ptr()));
            assert_eq!(value["emotion"], "angry");

            let value = take_json(wellmind_detect_faces(json.as_ptr()));
            assert_eq!(value["faces_detected"], 1);

            let value = take_json(wellmind_analyze_simple(json.as_ptr()));
            assert_eq!(value["estimated_mood"], "neutral");
        }
    }

    #[test]
    fn test_ffi_no_faces() {
        let json = CString::new(r#"{"faces": []}"#).unwrap();
        unsafe {
            let result = wellmind_analyze_emotion(json.as_ptr());
            assert!(result.is_null());
            let error = CStr::from_ptr(wellmind_last_error()).to_str().unwrap();
            assert_eq!(error, "No face detected in image");

            let value = take_json(wellmind_detect_faces(json.as_ptr()));
            assert_eq!(value["faces_detected"], 0);
            assert_eq!(value["overall_mood"], "No faces detected");
        }
    }

    #[test]
    fn test_ffi_pipeline_lifecycle() {
        let config = CString::new(r#"{"stress_confidence_threshold": 0.99}"#).unwrap();
        let json = sample_record_json();
        unsafe {
            let pipeline = wellmind_pipeline_new(config.as_ptr());
            assert!(!pipeline.is_null());

            // 0.96 is below the configured threshold
            let value = take_json(wellmind_pipeline_analyze_emotion(pipeline, json.as_ptr()));
            assert_eq!(value["stress_level"], "Medium");

            let value = take_json(wellmind_pipeline_wellness_score(pipeline, json.as_ptr()));
            assert_eq!(value["stress_level"], "High");

            let value = take_json(wellmind_pipeline_detect_faces(pipeline, json.as_ptr()));
            assert_eq!(value["faces_detected"], 1);

            let value = take_json(wellmind_pipeline_analyze_simple(pipeline, json.as_ptr()));
            assert_eq!(value["detected_faces"], 1);

            wellmind_pipeline_free(pipeline);

            let default_pipeline = wellmind_pipeline_new(ptr::null());
            assert!(!default_pipeline.is_null());
            wellmind_pipeline_free(default_pipeline);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = wellmind_analyze_emotion(invalid_json.as_ptr());
            assert!(result.is_null());
            let error = CStr::from_ptr(wellmind_last_error()).to_str().unwrap();
            assert!(!error.is_empty());

            assert!(wellmind_wellness_score(ptr::null()).is_null());
            let error = CStr::from_ptr(wellmind_last_error()).to_str().unwrap();
            assert_eq!(error, "Invalid JSON string pointer");

            let json = sample_record_json();
            assert!(wellmind_pipeline_analyze_emotion(ptr::null(), json.as_ptr()).is_null());

            let bad_config = CString::new(r#"{"wellness_low_cutoff": 40}"#).unwrap();
            assert!(wellmind_pipeline_new(bad_config.as_ptr()).is_null());
            assert!(!wellmind_last_error().is_null());

            wellmind_free_string(ptr::null_mut());
            wellmind_pipeline_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = wellmind_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::WELLMIND_VERSION);
        }
    }
}
