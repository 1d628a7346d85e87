//! Fake MediaCore string suite backed by a per-thread slab.
//!
//! `PrSDKString::opaque[0]` holds the slot index plus one, so the all-zero
//! value is the empty string hosts accept for disposal.

use std::ffi::CStr;

use hostsuite_core::ffi::*;

use crate::with_state;

const TAG: u64 = 0x5354_5247; // "STRG"

pub static FAKE_STRING_SUITE: PrSDKStringSuite = PrSDKStringSuite {
    DisposeString: Some(fake_dispose_string),
    AllocateFromUTF8: Some(fake_allocate_from_utf8),
    CopyToUTF8String: Some(fake_copy_to_utf8),
    AllocateFromUTF16: Some(fake_allocate_from_utf16),
    CopyToUTF16String: Some(fake_copy_to_utf16),
};

fn store(string: String, out: *mut PrSDKString) -> prSuiteError {
    with_state(|state| {
        state.strings.push(Some(string));
        let slot = state.strings.len() as u64;
        unsafe { *out = PrSDKString { opaque: [slot, TAG] } };
        suiteError_NoError
    })
    .unwrap_or(suiteError_InvalidCall)
}

fn lookup<R>(
    sdk_string: *const PrSDKString,
    f: impl FnOnce(&str) -> R,
) -> Result<R, prSuiteError> {
    if sdk_string.is_null() {
        return Err(suiteError_InvalidParms);
    }
    let raw = unsafe { *sdk_string };
    with_state(|state| {
        let slot = raw.opaque[0].checked_sub(1).ok_or(suiteError_StringNotFound)? as usize;
        if raw.opaque[1] != TAG {
            return Err(suiteError_StringNotFound);
        }
        match state.strings.get(slot) {
            Some(Some(string)) => Ok(f(string)),
            _ => Err(suiteError_StringNotFound),
        }
    })
    .unwrap_or(Err(suiteError_InvalidCall))
}

unsafe extern "C" fn fake_dispose_string(sdk_string: *const PrSDKString) -> prSuiteError {
    if sdk_string.is_null() {
        return suiteError_InvalidParms;
    }
    let raw = unsafe { *sdk_string };
    if raw == PrSDKString::default() {
        return suiteError_NoError;
    }
    with_state(|state| {
        let slot = match raw.opaque[0].checked_sub(1) {
            Some(slot) if raw.opaque[1] == TAG => slot as usize,
            _ => return suiteError_StringNotFound,
        };
        match state.strings.get_mut(slot) {
            Some(entry @ Some(_)) => {
                *entry = None;
                suiteError_NoError
            }
            _ => suiteError_StringNotFound,
        }
    })
    .unwrap_or(suiteError_InvalidCall)
}

unsafe extern "C" fn fake_allocate_from_utf8(
    input: *const u8,
    out: *mut PrSDKString,
) -> prSuiteError {
    if input.is_null() || out.is_null() {
        return suiteError_InvalidParms;
    }
    let bytes = unsafe { CStr::from_ptr(input.cast()) }.to_bytes();
    match std::str::from_utf8(bytes) {
        Ok(string) => store(string.to_owned(), out),
        Err(_) => suiteError_InvalidParms,
    }
}

unsafe extern "C" fn fake_allocate_from_utf16(
    input: *const u16,
    out: *mut PrSDKString,
) -> prSuiteError {
    if input.is_null() || out.is_null() {
        return suiteError_InvalidParms;
    }
    let mut len = 0;
    while unsafe { *input.add(len) } != 0 {
        len += 1;
    }
    let units = unsafe { std::slice::from_raw_parts(input, len) };
    match String::from_utf16(units) {
        Ok(string) => store(string, out),
        Err(_) => suiteError_InvalidParms,
    }
}

unsafe extern "C" fn fake_copy_to_utf8(
    sdk_string: *const PrSDKString,
    buffer: *mut u8,
    io_size: *mut csSDK_uint32,
) -> prSuiteError {
    if io_size.is_null() {
        return suiteError_InvalidParms;
    }
    let capacity = unsafe { *io_size } as usize;
    let result = lookup(sdk_string, |string| {
        let required = string.len() + 1;
        if capacity < required || buffer.is_null() {
            return Err(required);
        }
        Ok(unsafe { copy_str_to_host_buffer(buffer, capacity, string) })
    });
    finish_copy(result, io_size)
}

unsafe extern "C" fn fake_copy_to_utf16(
    sdk_string: *const PrSDKString,
    buffer: *mut u16,
    io_size: *mut csSDK_uint32,
) -> prSuiteError {
    if io_size.is_null() {
        return suiteError_InvalidParms;
    }
    let capacity = unsafe { *io_size } as usize;
    let result = lookup(sdk_string, |string| {
        let units: Vec<u16> = string.encode_utf16().chain(std::iter::once(0)).collect();
        if capacity < units.len() || buffer.is_null() {
            return Err(units.len());
        }
        unsafe { std::ptr::copy_nonoverlapping(units.as_ptr(), buffer, units.len()) };
        Ok(units.len())
    });
    finish_copy(result, io_size)
}

/// Report written (success) or required (too small) element counts.
fn finish_copy(
    result: Result<Result<usize, usize>, prSuiteError>,
    io_size: *mut csSDK_uint32,
) -> prSuiteError {
    match result {
        Ok(Ok(written)) => {
            unsafe { *io_size = written as csSDK_uint32 };
            suiteError_NoError
        }
        Ok(Err(required)) => {
            unsafe { *io_size = required as csSDK_uint32 };
            suiteError_StringBufferTooSmall
        }
        Err(err) => err,
    }
}
