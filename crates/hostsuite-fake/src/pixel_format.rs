//! Fake pixel format suite. Knows 8-bit BGRA only; world creation is left
//! unimplemented so callers see an empty table entry.

use std::ffi::c_void;

use hostsuite_core::ffi::*;

use crate::with_state;

pub static FAKE_PIXEL_FORMAT_SUITE: PF_PixelFormatSuite1 = PF_PixelFormatSuite1 {
    AddSupportedPixelFormat: Some(fake_add_supported),
    ClearSupportedPixelFormats: Some(fake_clear_supported),
    NewWorldOfPixelFormat: None,
    DisposeWorld: None,
    GetPixelFormat: Some(fake_get_pixel_format),
    GetBlackForPixelFormat: Some(fake_black),
    GetWhiteForPixelFormat: Some(fake_white),
    ConvertColorToPixelFormattedData: Some(fake_convert),
};

unsafe extern "C" fn fake_add_supported(
    _effect_ref: PF_ProgPtr,
    pixel_format: PrPixelFormat,
) -> PF_Err {
    with_state(|state| {
        if !state.supported_pixel_formats.contains(&pixel_format) {
            state.supported_pixel_formats.push(pixel_format);
        }
        suiteError_NoError
    })
    .unwrap_or(suiteError_InvalidCall)
}

unsafe extern "C" fn fake_clear_supported(_effect_ref: PF_ProgPtr) -> PF_Err {
    with_state(|state| {
        state.supported_pixel_formats.clear();
        suiteError_NoError
    })
    .unwrap_or(suiteError_InvalidCall)
}

/// Fake worlds are just a `PrPixelFormat` in memory.
unsafe extern "C" fn fake_get_pixel_format(
    world: *mut PF_EffectWorld,
    pixel_format: *mut PrPixelFormat,
) -> PF_Err {
    if world.is_null() || pixel_format.is_null() {
        return suiteError_InvalidParms;
    }
    unsafe { *pixel_format = *(world as *const PrPixelFormat) };
    suiteError_NoError
}

fn write_bgra(pixel_format: PrPixelFormat, bgra: [u8; 4], pixel_data: *mut c_void) -> PF_Err {
    if pixel_format != PrPixelFormat_BGRA_4444_8u {
        return suiteError_NotImplemented;
    }
    if pixel_data.is_null() {
        return suiteError_InvalidParms;
    }
    unsafe { std::ptr::copy_nonoverlapping(bgra.as_ptr(), pixel_data.cast::<u8>(), 4) };
    suiteError_NoError
}

unsafe extern "C" fn fake_black(pixel_format: PrPixelFormat, pixel_data: *mut c_void) -> PF_Err {
    write_bgra(pixel_format, [0, 0, 0, 255], pixel_data)
}

unsafe extern "C" fn fake_white(pixel_format: PrPixelFormat, pixel_data: *mut c_void) -> PF_Err {
    write_bgra(pixel_format, [255, 255, 255, 255], pixel_data)
}

unsafe extern "C" fn fake_convert(
    pixel_format: PrPixelFormat,
    alpha: f32,
    red: f32,
    green: f32,
    blue: f32,
    pixel_data: *mut c_void,
) -> PF_Err {
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    write_bgra(pixel_format, [to_u8(blue), to_u8(green), to_u8(red), to_u8(alpha)], pixel_data)
}
