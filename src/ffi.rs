//! FFI bindings for the BioAge engine
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `bioage_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::BioAgeConfig;
use crate::engine::{bio_age_from_json, BioAgeEngine};
use crate::types::BioAgeRequest;

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

// ============================================================================
// Stateless API
// ============================================================================

/// Score a JSON `BioAgeRequest` and return a JSON `BioAgeResult`.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - `config_json` may be NULL (default configuration) or a valid C string.
/// - Returns a newly allocated string that must be freed with `bioage_free_string`.
/// - Returns NULL on error; call `bioage_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bioage_calculate_json(
    request_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let request = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request string pointer");
            return ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        None
    } else {
        match cstr_to_string(config_json) {
            Some(s) => Some(s),
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        }
    };

    match bio_age_from_json(&request, config.as_deref()) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the default configuration as JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `bioage_free_string`.
#[no_mangle]
pub unsafe extern "C" fn bioage_default_config_json() -> *mut c_char {
    clear_last_error();

    match BioAgeConfig::default().to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Engine Handle API
// ============================================================================

/// Opaque handle to a configured BioAgeEngine
pub struct BioAgeEngineHandle {
    engine: BioAgeEngine,
}

/// Create an engine from a JSON configuration (NULL for defaults).
///
/// # Safety
/// - `config_json` may be NULL or a valid null-terminated C string.
/// - Must be freed with `bioage_engine_free`.
/// - Returns NULL on error; call `bioage_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bioage_engine_new(config_json: *const c_char) -> *mut BioAgeEngineHandle {
    clear_last_error();

    let engine = if config_json.is_null() {
        Ok(BioAgeEngine::default())
    } else {
        match cstr_to_string(config_json) {
            Some(json) => BioAgeConfig::from_json(&json).and_then(BioAgeEngine::new),
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        }
    };

    match engine {
        Ok(engine) => Box::into_raw(Box::new(BioAgeEngineHandle { engine })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `bioage_engine_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn bioage_engine_free(engine: *mut BioAgeEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Score a JSON `BioAgeRequest` with a configured engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `bioage_engine_new`.
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `bioage_free_string`.
/// - Returns NULL on error; call `bioage_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bioage_engine_calculate(
    engine: *const BioAgeEngineHandle,
    request_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let handle = &*engine;

    let json_str = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request string pointer");
            return ptr::null_mut();
        }
    };

    let request: BioAgeRequest = match serde_json::from_str(&json_str) {
        Ok(request) => request,
        Err(e) => {
            set_last_error(&format!("Failed to parse request: {e}"));
            return ptr::null_mut();
        }
    };

    let output = handle
        .engine
        .calculate(&request)
        .map_err(|e| e.to_string())
        .and_then(|result| serde_json::to_string(&result).map_err(|e| e.to_string()));

    match output {
        Ok(json) => string_to_cstr(&json),
        Err(msg) => {
            set_last_error(&msg);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory and Diagnostics
// ============================================================================

/// Free a string returned by any `bioage_*` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by this library, or NULL.
#[no_mangle]
pub unsafe extern "C" fn bioage_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message for the current thread.
///
/// # Safety
/// - Returns a pointer valid until the next `bioage_*` call on this thread. Do NOT free.
/// - Returns NULL when the last call succeeded.
#[no_mangle]
pub unsafe extern "C" fn bioage_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the engine version string.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn bioage_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
