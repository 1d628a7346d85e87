use std::ffi::c_void;

use crate::error::{check_suite_err, SuiteError};
use crate::ffi::*;

crate::define_suite!(
    /// Pixel format negotiation. Only the video editing host serves it.
    PixelFormatSuite,
    PF_PixelFormatSuite1,
    kPFPixelFormatSuite,
    kPFPixelFormatSuiteVersion1
);

/// Effect reference the host passes with each command.
#[derive(Debug, Clone, Copy)]
pub struct EffectRef(PF_ProgPtr);

impl EffectRef {
    /// # Safety
    ///
    /// `ptr` must be the effect reference from the host's current call.
    pub unsafe fn from_raw(ptr: PF_ProgPtr) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(&self) -> PF_ProgPtr {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Bgra4444_8u,
    Vuya4444_8u,
    Argb4444_8u,
    Other(PrPixelFormat),
}

impl From<PixelFormat> for PrPixelFormat {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::Bgra4444_8u => PrPixelFormat_BGRA_4444_8u,
            PixelFormat::Vuya4444_8u => PrPixelFormat_VUYA_4444_8u,
            PixelFormat::Argb4444_8u => PrPixelFormat_ARGB_4444_8u,
            PixelFormat::Other(raw) => raw,
        }
    }
}

impl From<PrPixelFormat> for PixelFormat {
    fn from(raw: PrPixelFormat) -> Self {
        match raw {
            PrPixelFormat_BGRA_4444_8u => PixelFormat::Bgra4444_8u,
            PrPixelFormat_VUYA_4444_8u => PixelFormat::Vuya4444_8u,
            PrPixelFormat_ARGB_4444_8u => PixelFormat::Argb4444_8u,
            other => PixelFormat::Other(other),
        }
    }
}

impl PixelFormat {
    /// Bytes for one pixel value. Unknown formats get 32 bytes, twice the
    /// widest four-channel `f32` pixel.
    pub fn pixel_size(self) -> usize {
        match self {
            PixelFormat::Bgra4444_8u | PixelFormat::Vuya4444_8u | PixelFormat::Argb4444_8u => 4,
            PixelFormat::Other(_) => 32,
        }
    }
}

impl<'ctx> PixelFormatSuite<'ctx> {
    pub fn add_supported_pixel_format(
        &self,
        effect_ref: EffectRef,
        format: PixelFormat,
    ) -> Result<(), SuiteError> {
        check_suite_err(crate::call_suite_fn!(
            self,
            AddSupportedPixelFormat,
            effect_ref.as_ptr(),
            format.into()
        ))
    }

    pub fn clear_supported_pixel_formats(&self, effect_ref: EffectRef) -> Result<(), SuiteError> {
        check_suite_err(crate::call_suite_fn!(
            self,
            ClearSupportedPixelFormats,
            effect_ref.as_ptr()
        ))
    }

    /// # Safety
    ///
    /// `world` must be a live image buffer handed over by the host.
    pub unsafe fn pixel_format_of(
        &self,
        world: *mut PF_EffectWorld,
    ) -> Result<PixelFormat, SuiteError> {
        let mut raw: PrPixelFormat = 0;
        check_suite_err(crate::call_suite_fn!(self, GetPixelFormat, world, &mut raw))?;
        Ok(raw.into())
    }

    /// The "black" value for `format`.
    pub fn black_for_pixel_format(&self, format: PixelFormat) -> Result<Vec<u8>, SuiteError> {
        let mut pixel = vec![0u8; format.pixel_size()];
        check_suite_err(crate::call_suite_fn!(
            self,
            GetBlackForPixelFormat,
            format.into(),
            pixel.as_mut_ptr() as *mut c_void
        ))?;
        Ok(pixel)
    }

    /// The "white" value for `format`.
    pub fn white_for_pixel_format(&self, format: PixelFormat) -> Result<Vec<u8>, SuiteError> {
        let mut pixel = vec![0u8; format.pixel_size()];
        check_suite_err(crate::call_suite_fn!(
            self,
            GetWhiteForPixelFormat,
            format.into(),
            pixel.as_mut_ptr() as *mut c_void
        ))?;
        Ok(pixel)
    }

    /// Encode a normalized ARGB color (0.0 - 1.0) as a pixel of `format`.
    pub fn convert_color_to_pixel_formatted_data(
        &self,
        format: PixelFormat,
        alpha: f32,
        red: f32,
        green: f32,
        blue: f32,
    ) -> Result<Vec<u8>, SuiteError> {
        let mut pixel = vec![0u8; format.pixel_size()];
        check_suite_err(crate::call_suite_fn!(
            self,
            ConvertColorToPixelFormattedData,
            format.into(),
            alpha,
            red,
            green,
            blue,
            pixel.as_mut_ptr() as *mut c_void
        ))?;
        Ok(pixel)
    }
}
