//! MediaCore string-interchange suite.
//!
//! Hosts return `PrSDKString` values from several calls; this suite is the
//! only way to read or free them.

use std::ffi::CString;
use std::mem::ManuallyDrop;

use tracing::warn;

use crate::error::{check_suite_err, SuiteError};
use crate::ffi::*;

/// First guess for copy-out buffers; one retry with the host's answer follows.
const INITIAL_CAPACITY: usize = 128;

crate::define_suite!(
    /// String allocation and conversion through the host.
    StringSuite,
    PrSDKStringSuite,
    kPrSDKStringSuite,
    kPrSDKStringSuiteVersion
);

impl<'ctx> StringSuite<'ctx> {
    /// Dispose of a host string. Passing an empty string is allowed.
    ///
    /// # Errors
    ///
    /// Host error `StringNotFound` if the string was never allocated or is
    /// already disposed.
    pub fn dispose_string(&self, sdk_string: &PrSDKString) -> Result<(), SuiteError> {
        check_suite_err(crate::call_suite_fn!(self, DisposeString, sdk_string))
    }

    /// Allocate a host string from UTF-8. The result must be disposed, see
    /// [`new_string`](Self::new_string) for an owning variant.
    pub fn allocate_from_utf8(&self, string: &str) -> Result<PrSDKString, SuiteError> {
        let input = CString::new(string).map_err(|_| SuiteError::InteriorNul)?;
        let mut out = PrSDKString::default();
        check_suite_err(crate::call_suite_fn!(
            self,
            AllocateFromUTF8,
            input.as_bytes_with_nul().as_ptr(),
            &mut out
        ))?;
        Ok(out)
    }

    /// Allocate a host string from UTF-16 code units (no terminator needed).
    pub fn allocate_from_utf16(&self, units: &[u16]) -> Result<PrSDKString, SuiteError> {
        if units.contains(&0) {
            return Err(SuiteError::InteriorNul);
        }
        let mut input = Vec::with_capacity(units.len() + 1);
        input.extend_from_slice(units);
        input.push(0);

        let mut out = PrSDKString::default();
        check_suite_err(crate::call_suite_fn!(self, AllocateFromUTF16, input.as_ptr(), &mut out))?;
        Ok(out)
    }

    /// Copy a host string into `buffer` as NUL-terminated UTF-8.
    ///
    /// Returns the number of bytes before the terminator.
    ///
    /// # Errors
    ///
    /// [`SuiteError::StringBufferTooSmall`] with the element count the host
    /// asked for when `buffer` cannot hold the string and its terminator.
    pub fn copy_to_utf8(
        &self,
        sdk_string: &PrSDKString,
        buffer: &mut [u8],
    ) -> Result<usize, SuiteError> {
        let mut size = element_count(buffer.len());
        let err = crate::call_suite_fn!(
            self,
            CopyToUTF8String,
            sdk_string,
            buffer.as_mut_ptr(),
            &mut size
        );
        written_or_required(err, size, buffer.len())
    }

    /// Copy a host string into `buffer` as NUL-terminated UTF-16.
    ///
    /// Returns the number of code units before the terminator.
    pub fn copy_to_utf16(
        &self,
        sdk_string: &PrSDKString,
        buffer: &mut [u16],
    ) -> Result<usize, SuiteError> {
        let mut size = element_count(buffer.len());
        let err = crate::call_suite_fn!(
            self,
            CopyToUTF16String,
            sdk_string,
            buffer.as_mut_ptr(),
            &mut size
        );
        written_or_required(err, size, buffer.len())
    }

    /// Read a host string into a Rust `String`, growing the buffer once if the
    /// host asks for more room.
    pub fn copy_to_string(&self, sdk_string: &PrSDKString) -> Result<String, SuiteError> {
        let mut buffer = vec![0u8; INITIAL_CAPACITY];
        let len = match self.copy_to_utf8(sdk_string, &mut buffer) {
            Err(SuiteError::StringBufferTooSmall { required }) => {
                // Some hosts leave the terminator out of `required`.
                buffer = vec![0u8; required.max(1) + 1];
                self.copy_to_utf8(sdk_string, &mut buffer)?
            }
            other => other?,
        };
        buffer.truncate(len);
        String::from_utf8(buffer).map_err(|_| SuiteError::InvalidEncoding("UTF-8"))
    }

    /// Read a host string as UTF-16 code units, without terminator.
    pub fn copy_to_utf16_vec(&self, sdk_string: &PrSDKString) -> Result<Vec<u16>, SuiteError> {
        let mut buffer = vec![0u16; INITIAL_CAPACITY];
        let len = match self.copy_to_utf16(sdk_string, &mut buffer) {
            Err(SuiteError::StringBufferTooSmall { required }) => {
                buffer = vec![0u16; required.max(1) + 1];
                self.copy_to_utf16(sdk_string, &mut buffer)?
            }
            other => other?,
        };
        buffer.truncate(len);
        Ok(buffer)
    }

    /// Allocate a host string that disposes itself on drop.
    pub fn new_string(&self, string: &str) -> Result<SdkString<'_, 'ctx>, SuiteError> {
        let raw = self.allocate_from_utf8(string)?;
        Ok(SdkString { suite: self, raw })
    }

    /// Take ownership of a host string returned by some other suite call.
    pub fn adopt(&self, raw: PrSDKString) -> SdkString<'_, 'ctx> {
        SdkString { suite: self, raw }
    }
}

fn element_count(len: usize) -> csSDK_uint32 {
    csSDK_uint32::try_from(len).unwrap_or(csSDK_uint32::MAX)
}

/// `size` is in/out: capacity going in; on success the elements written
/// including the terminator, on failure the elements required.
fn written_or_required(
    err: prSuiteError,
    size: csSDK_uint32,
    capacity: usize,
) -> Result<usize, SuiteError> {
    if err == suiteError_StringBufferTooSmall {
        return Err(SuiteError::StringBufferTooSmall {
            required: size as usize,
        });
    }
    check_suite_err(err)?;
    Ok((size as usize).min(capacity).saturating_sub(1))
}

/// Host string owned by the plugin, disposed on drop.
pub struct SdkString<'s, 'ctx> {
    suite: &'s StringSuite<'ctx>,
    raw: PrSDKString,
}

impl SdkString<'_, '_> {
    pub fn as_raw(&self) -> &PrSDKString {
        &self.raw
    }

    pub fn to_rust_string(&self) -> Result<String, SuiteError> {
        self.suite.copy_to_string(&self.raw)
    }

    /// Give the string back to raw handling; the caller disposes it.
    pub fn into_raw(self) -> PrSDKString {
        let this = ManuallyDrop::new(self);
        this.raw
    }

    /// Dispose now, surfacing the host's answer.
    pub fn dispose(self) -> Result<(), SuiteError> {
        let this = ManuallyDrop::new(self);
        this.suite.dispose_string(&this.raw)
    }
}

impl Drop for SdkString<'_, '_> {
    fn drop(&mut self) {
        if let Err(err) = self.suite.dispose_string(&self.raw) {
            warn!(%err, "disposing host string failed");
        }
    }
}
