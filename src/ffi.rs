//! FFI bindings for strokeprint
//!
//! This module provides C-compatible functions for calling strokeprint from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `strokeprint_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::pipeline::{compare_json, extract_json, verify_json, AuthProcessor};
use crate::types::BiometricType;

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

/// Read a required string argument, recording an error naming it on failure
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Borrow the processor behind a handle, recording an error for NULL
unsafe fn processor_mut<'a>(handle: *mut AuthProcessorHandle) -> Option<&'a mut AuthProcessor> {
    match handle.as_mut() {
        Some(handle) => Some(&mut handle.processor),
        None => {
            set_last_error("Null processor pointer");
            None
        }
    }
}

/// Return the string result, or record the error and return NULL
fn into_cstr(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Extract a feature set from capture JSON.
///
/// # Safety
/// - `capture_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `strokeprint_free_string`.
/// - Returns NULL on error; call `strokeprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_extract(capture_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(capture) = required_arg(capture_json, "capture JSON") else {
        return ptr::null_mut();
    };
    into_cstr(extract_json(capture))
}

/// Compare two feature sets and return the comparison result JSON.
///
/// # Safety
/// - `reference_json` and `candidate_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `strokeprint_free_string`.
/// - Returns NULL on error; call `strokeprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_compare(
    reference_json: *const c_char,
    candidate_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(reference) = required_arg(reference_json, "reference JSON") else {
        return ptr::null_mut();
    };
    let Some(candidate) = required_arg(candidate_json, "candidate JSON") else {
        return ptr::null_mut();
    };
    into_cstr(compare_json(reference, candidate))
}

/// Extract and compare two raw captures.
///
/// # Safety
/// - `reference_capture` and `candidate_capture` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `strokeprint_free_string`.
/// - Returns NULL on error; call `strokeprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_verify(
    reference_capture: *const c_char,
    candidate_capture: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(reference) = required_arg(reference_capture, "reference capture") else {
        return ptr::null_mut();
    };
    let Some(candidate) = required_arg(candidate_capture, "candidate capture") else {
        return ptr::null_mut();
    };
    into_cstr(verify_json(reference, candidate))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to an AuthProcessor
pub struct AuthProcessorHandle {
    processor: AuthProcessor,
}

/// Create a new AuthProcessor.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration, otherwise it
///   must be a valid null-terminated C string.
/// - Returns a pointer to a newly allocated AuthProcessor.
/// - Must be freed with `strokeprint_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_processor_new(
    config_json: *const c_char,
) -> *mut AuthProcessorHandle {
    clear_last_error();

    let processor = if config_json.is_null() {
        Ok(AuthProcessor::new())
    } else {
        match required_arg(config_json, "config JSON") {
            Some(json) => EngineConfig::from_json(&json).and_then(AuthProcessor::with_config),
            None => return ptr::null_mut(),
        }
    };

    match processor {
        Ok(processor) => Box::into_raw(Box::new(AuthProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an AuthProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `strokeprint_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_processor_free(processor: *mut AuthProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Enroll a baseline from a JSON array of captures; returns the baseline JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `strokeprint_processor_new`.
/// - `user_id`, `biometric_type`, and `captures_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `strokeprint_free_string`.
/// - Returns NULL on error; call `strokeprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_processor_enroll(
    processor: *mut AuthProcessorHandle,
    user_id: *const c_char,
    biometric_type: *const c_char,
    captures_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let (Some(processor), Some(user), Some(kind), Some(captures)) = (
        processor_mut(processor),
        required_arg(user_id, "user_id"),
        required_arg(biometric_type, "biometric_type"),
        required_arg(captures_json, "captures JSON"),
    ) else {
        return ptr::null_mut();
    };

    into_cstr(enroll_captures(processor, &user, &kind, &captures))
}

fn enroll_captures(
    processor: &mut AuthProcessor,
    user_id: &str,
    biometric_type: &str,
    captures_json: &str,
) -> Result<String, ComputeError> {
    let biometric_type: BiometricType = biometric_type.parse().map_err(ComputeError::ParseError)?;
    let captures: Vec<serde_json::Value> = serde_json::from_str(captures_json)?;
    let captures = captures
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&str> = captures.iter().map(String::as_str).collect();

    let baseline = processor.enroll(user_id, biometric_type, &refs)?;
    serde_json::to_string(&baseline).map_err(ComputeError::JsonError)
}

/// Authenticate a capture; returns the audit record JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `strokeprint_processor_new`.
/// - `user_id`, `biometric_type`, and `capture_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `strokeprint_free_string`.
/// - Returns NULL on error; call `strokeprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_processor_authenticate(
    processor: *mut AuthProcessorHandle,
    user_id: *const c_char,
    biometric_type: *const c_char,
    capture_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let (Some(processor), Some(user), Some(kind), Some(capture)) = (
        processor_mut(processor),
        required_arg(user_id, "user_id"),
        required_arg(biometric_type, "biometric_type"),
        required_arg(capture_json, "capture JSON"),
    ) else {
        return ptr::null_mut();
    };

    let result = kind
        .parse::<BiometricType>()
        .map_err(ComputeError::ParseError)
        .and_then(|kind| processor.authenticate_json(&user, kind, &capture));
    into_cstr(result)
}

/// Save processor baselines to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `strokeprint_processor_new`.
/// - Returns a newly allocated string that must be freed with `strokeprint_free_string`.
/// - Returns NULL on error; call `strokeprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_processor_save_baselines(
    processor: *mut AuthProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    match processor_mut(processor) {
        Some(processor) => into_cstr(processor.save_baselines()),
        None => ptr::null_mut(),
    }
}

/// Load processor baselines from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `strokeprint_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `strokeprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_processor_load_baselines(
    processor: *mut AuthProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    let (Some(processor), Some(json_str)) = (processor_mut(processor), required_arg(json, "JSON"))
    else {
        return -1;
    };

    match processor.load_baselines(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by strokeprint functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a strokeprint function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next strokeprint function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the strokeprint library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn strokeprint_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
