//! Hardcoded plugin-SDK constants and C-repr structs.
//!
//! These replace bindgen output over the vendor headers. Layouts are sourced
//! from `SPBasic.h`, the MediaCore string suite declaration and
//! `AE_EffectPixelFormat.h`. Field order, integer widths and packing must match
//! the host exactly: a mismatch is silent memory corruption, not an error.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

use std::ffi::{c_char, c_void, CStr};

// =====================================================================
// Scalar types
// =====================================================================

pub type SPErr = i32;
pub type SPBoolean = u8;
pub type prSuiteError = i32;
pub type PF_Err = i32;
pub type PF_NewWorldFlags = i32;
pub type PrPixelFormat = u32;
pub type csSDK_int32 = i32;
pub type csSDK_uint32 = u32;

/// Opaque effect reference handed to the plugin by the host.
pub type PF_ProgPtr = *mut c_void;

/// Opaque host image buffer. Only ever handled by pointer.
#[repr(C)]
pub struct PF_EffectWorld {
    _private: [u8; 0],
}

/// Multi-character constant as the vendor compilers pack it ('S!Fd' etc.).
const fn sp_tag(tag: &[u8; 4]) -> SPErr {
    ((tag[0] as i32) << 24) | ((tag[1] as i32) << 16) | ((tag[2] as i32) << 8) | (tag[3] as i32)
}

// =====================================================================
// Basic suite error codes (SPErrorCodes.h)
// =====================================================================

pub const kSPNoError: SPErr = 0;
pub const kSPUnimplementedError: SPErr = sp_tag(b"!IMP");
pub const kSPSuiteNotFoundError: SPErr = sp_tag(b"S!Fd");
pub const kSPBadParameterError: SPErr = sp_tag(b"Parm");
pub const kSPLogicError: SPErr = sp_tag(b"fbar");
pub const kSPOutOfMemoryError: SPErr = -108;

// =====================================================================
// Suite error codes (PrSDKErrorSuite.h / PrSDKStringSuite.h)
// =====================================================================

pub const suiteError_NoError: prSuiteError = 0;
pub const suiteError_Fail: prSuiteError = 0x8000_0000_u32 as i32;
pub const suiteError_InvalidParms: prSuiteError = 0x8000_0001_u32 as i32;
pub const suiteError_OutOfMemory: prSuiteError = 0x8000_0002_u32 as i32;
pub const suiteError_InvalidCall: prSuiteError = 0x8000_0003_u32 as i32;
pub const suiteError_NotImplemented: prSuiteError = 0x8000_0004_u32 as i32;
pub const suiteError_IDNotValid: prSuiteError = 0x8000_0005_u32 as i32;
pub const suiteError_StringNotFound: prSuiteError = 0x800A_0000_u32 as i32;
pub const suiteError_StringBufferTooSmall: prSuiteError = 0x800A_0001_u32 as i32;

// =====================================================================
// Basic suite (SPBasic.h)
// =====================================================================

/// The host's root table. Its pointer is the acquisition context.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct SPBasicSuite {
    pub AcquireSuite: Option<
        unsafe extern "C" fn(name: *const c_char, version: i32, suite: *mut *const c_void) -> SPErr,
    >,
    pub ReleaseSuite: Option<unsafe extern "C" fn(name: *const c_char, version: i32) -> SPErr>,
    pub IsEqual:
        Option<unsafe extern "C" fn(token1: *const c_char, token2: *const c_char) -> SPBoolean>,
    pub AllocateBlock: Option<unsafe extern "C" fn(size: usize, block: *mut *mut c_void) -> SPErr>,
    pub FreeBlock: Option<unsafe extern "C" fn(block: *mut c_void) -> SPErr>,
    pub ReallocateBlock: Option<
        unsafe extern "C" fn(
            block: *mut c_void,
            new_size: usize,
            new_block: *mut *mut c_void,
        ) -> SPErr,
    >,
    pub Undefined: Option<unsafe extern "C" fn() -> SPErr>,
}

// =====================================================================
// String-interchange suite
// =====================================================================

pub const kPrSDKStringSuite: &CStr = c"MediaCore StringSuite";
pub const kPrSDKStringSuiteVersion: i32 = 1;

/// Host-owned string. The plugin only moves the opaque value around.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PrSDKString {
    pub opaque: [u64; 2],
}

/// The host declares this table inside `#pragma pack(push, 1)`.
#[repr(C, packed(1))]
#[derive(Copy, Clone)]
pub struct PrSDKStringSuite {
    pub DisposeString:
        Option<unsafe extern "C" fn(in_sdk_string: *const PrSDKString) -> prSuiteError>,
    pub AllocateFromUTF8: Option<
        unsafe extern "C" fn(
            in_utf8_string: *const u8,
            out_sdk_string: *mut PrSDKString,
        ) -> prSuiteError,
    >,
    pub CopyToUTF8String: Option<
        unsafe extern "C" fn(
            in_sdk_string: *const PrSDKString,
            out_utf8_buffer: *mut u8,
            io_utf8_buffer_size_in_elements: *mut csSDK_uint32,
        ) -> prSuiteError,
    >,
    pub AllocateFromUTF16: Option<
        unsafe extern "C" fn(
            in_utf16_string: *const u16,
            out_sdk_string: *mut PrSDKString,
        ) -> prSuiteError,
    >,
    pub CopyToUTF16String: Option<
        unsafe extern "C" fn(
            in_sdk_string: *const PrSDKString,
            out_utf16_buffer: *mut u16,
            io_utf16_buffer_size_in_elements: *mut csSDK_uint32,
        ) -> prSuiteError,
    >,
}

// =====================================================================
// Pixel format suite (video editing host only)
// =====================================================================

pub const kPFPixelFormatSuite: &CStr = c"PF Pixel Format Suite";
pub const kPFPixelFormatSuiteVersion1: i32 = 1;

/// `MAKE_PIXEL_FORMAT_FOURCC`: first character in the low byte.
pub const fn make_pixel_format_fourcc(tag: &[u8; 4]) -> PrPixelFormat {
    (tag[0] as u32) | ((tag[1] as u32) << 8) | ((tag[2] as u32) << 16) | ((tag[3] as u32) << 24)
}

pub const PrPixelFormat_BGRA_4444_8u: PrPixelFormat = make_pixel_format_fourcc(b"BGRA");
pub const PrPixelFormat_VUYA_4444_8u: PrPixelFormat = make_pixel_format_fourcc(b"VUYA");
pub const PrPixelFormat_ARGB_4444_8u: PrPixelFormat = make_pixel_format_fourcc(b"ARGB");

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct PF_PixelFormatSuite1 {
    pub AddSupportedPixelFormat:
        Option<unsafe extern "C" fn(effect_ref: PF_ProgPtr, pixel_format: PrPixelFormat) -> PF_Err>,
    pub ClearSupportedPixelFormats: Option<unsafe extern "C" fn(effect_ref: PF_ProgPtr) -> PF_Err>,
    pub NewWorldOfPixelFormat: Option<
        unsafe extern "C" fn(
            effect_ref: PF_ProgPtr,
            width: csSDK_uint32,
            height: csSDK_uint32,
            flags: PF_NewWorldFlags,
            pixel_format: PrPixelFormat,
            world: *mut PF_EffectWorld,
        ) -> PF_Err,
    >,
    pub DisposeWorld:
        Option<unsafe extern "C" fn(effect_ref: PF_ProgPtr, world: *mut PF_EffectWorld) -> PF_Err>,
    pub GetPixelFormat: Option<
        unsafe extern "C" fn(
            world: *mut PF_EffectWorld,
            pixel_format: *mut PrPixelFormat,
        ) -> PF_Err,
    >,
    pub GetBlackForPixelFormat: Option<
        unsafe extern "C" fn(pixel_format: PrPixelFormat, pixel_data: *mut c_void) -> PF_Err,
    >,
    pub GetWhiteForPixelFormat: Option<
        unsafe extern "C" fn(pixel_format: PrPixelFormat, pixel_data: *mut c_void) -> PF_Err,
    >,
    pub ConvertColorToPixelFormattedData: Option<
        unsafe extern "C" fn(
            pixel_format: PrPixelFormat,
            alpha: f32,
            red: f32,
            green: f32,
            blue: f32,
            pixel_data: *mut c_void,
        ) -> PF_Err,
    >,
}

// =====================================================================
// Utility
// =====================================================================

/// Copy a Rust string into a host-provided buffer, null-terminating it.
///
/// Stops at the first interior NUL and truncates to fit. Returns the number of
/// bytes written, terminator included.
///
/// # Safety
///
/// `address` must be a valid pointer to a buffer of at least `max_to_write` bytes.
pub unsafe fn copy_str_to_host_buffer(
    address: *mut u8,
    max_to_write: usize,
    string: &str,
) -> usize {
    if max_to_write == 0 || address.is_null() {
        return 0;
    }

    let bytes = string.as_bytes();
    let bytes = match bytes.iter().position(|&b| b == 0) {
        Some(nul) => &bytes[..nul],
        None => bytes,
    };
    let to_copy = bytes.len().min(max_to_write - 1);
    let dest = unsafe { std::slice::from_raw_parts_mut(address, to_copy + 1) };

    dest[..to_copy].copy_from_slice(&bytes[..to_copy]);
    dest[to_copy] = 0;

    to_copy + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    const PTR: usize = size_of::<*const c_void>();

    #[test]
    fn string_suite_is_byte_packed() {
        assert_eq!(align_of::<PrSDKStringSuite>(), 1);
        assert_eq!(size_of::<PrSDKStringSuite>(), 5 * PTR);
    }

    #[test]
    fn string_suite_field_offsets() {
        assert_eq!(std::mem::offset_of!(PrSDKStringSuite, DisposeString), 0);
        assert_eq!(std::mem::offset_of!(PrSDKStringSuite, AllocateFromUTF8), PTR);
        assert_eq!(std::mem::offset_of!(PrSDKStringSuite, CopyToUTF8String), 2 * PTR);
        assert_eq!(std::mem::offset_of!(PrSDKStringSuite, AllocateFromUTF16), 3 * PTR);
        assert_eq!(std::mem::offset_of!(PrSDKStringSuite, CopyToUTF16String), 4 * PTR);
    }

    #[test]
    fn sdk_string_is_sixteen_bytes() {
        assert_eq!(size_of::<PrSDKString>(), 16);
    }

    #[test]
    fn basic_suite_has_seven_entries() {
        assert_eq!(size_of::<SPBasicSuite>(), 7 * PTR);
        assert_eq!(std::mem::offset_of!(SPBasicSuite, ReleaseSuite), PTR);
        assert_eq!(std::mem::offset_of!(SPBasicSuite, AllocateBlock), 3 * PTR);
    }

    #[test]
    fn pixel_format_suite_has_eight_entries() {
        assert_eq!(size_of::<PF_PixelFormatSuite1>(), 8 * PTR);
    }

    #[test]
    fn sp_error_tags_pack_big_endian() {
        assert_eq!(kSPSuiteNotFoundError, 0x5321_4664);
        assert_eq!(kSPBadParameterError, 0x5061_726D);
    }

    #[test]
    fn pixel_format_fourcc_packs_little_endian() {
        assert_eq!(PrPixelFormat_BGRA_4444_8u, 0x4152_4742);
    }

    #[test]
    fn copy_str_fits() {
        let mut buf = [0xFFu8; 8];
        let written = unsafe { copy_str_to_host_buffer(buf.as_mut_ptr(), buf.len(), "abc") };
        assert_eq!(written, 4);
        assert_eq!(&buf[..4], b"abc\0");
        assert_eq!(buf[4], 0xFF);
    }

    #[test]
    fn copy_str_truncates_and_terminates() {
        let mut buf = [0xFFu8; 4];
        let written = unsafe { copy_str_to_host_buffer(buf.as_mut_ptr(), buf.len(), "abcdef") };
        assert_eq!(written, 4);
        assert_eq!(&buf, b"abc\0");
    }

    #[test]
    fn copy_str_stops_at_interior_nul() {
        let mut buf = [0xFFu8; 8];
        let written = unsafe { copy_str_to_host_buffer(buf.as_mut_ptr(), buf.len(), "ab\0cd") };
        assert_eq!(written, 3);
        assert_eq!(&buf[..3], b"ab\0");
    }

    #[test]
    fn copy_str_zero_capacity_writes_nothing() {
        let mut buf = [0xFFu8; 1];
        let written = unsafe { copy_str_to_host_buffer(buf.as_mut_ptr(), 0, "abc") };
        assert_eq!(written, 0);
        assert_eq!(buf[0], 0xFF);
    }
}
