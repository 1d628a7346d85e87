//! Error taxonomy for suite acquisition and call-through.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::ffi::*;
use crate::name::{SuiteName, SuiteVersion};

/// Everything that can go wrong between a plugin and a host suite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuiteError {
    /// The host does not serve this name/version pair. Recoverable: disable
    /// whatever depended on the suite.
    #[error("suite {name} v{version} is not available from this host")]
    SuiteUnavailable { name: SuiteName, version: SuiteVersion },

    /// Acquisition attempted outside a live plugin session.
    #[error("acquisition context is not live")]
    ContextInvalid,

    #[error("suite {name} v{version} was already released")]
    AlreadyReleased { name: SuiteName, version: SuiteVersion },

    /// The handle was not produced by the context it was handed back to.
    #[error("suite {name} v{version} was never acquired from this context")]
    NeverAcquired { name: SuiteName, version: SuiteVersion },

    /// Output buffer too small; `required` counts elements including the terminator.
    #[error("string buffer too small, {required} elements required")]
    StringBufferTooSmall { required: usize },

    #[error("host table has no entry for {0}")]
    MissingFunction(&'static str),

    #[error("invalid suite name {0:?}")]
    InvalidName(String),

    #[error("string contains an interior NUL")]
    InteriorNul,

    #[error("host returned text that is not valid {0}")]
    InvalidEncoding(&'static str),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Known `prSuiteError` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u32)]
pub enum HostErrorCode {
    Fail = 0x8000_0000,
    InvalidParms = 0x8000_0001,
    OutOfMemory = 0x8000_0002,
    InvalidCall = 0x8000_0003,
    NotImplemented = 0x8000_0004,
    IdNotValid = 0x8000_0005,
    StringNotFound = 0x800A_0000,
    StringBufferTooSmall = 0x800A_0001,
}

impl HostErrorCode {
    pub fn description(self) -> &'static str {
        match self {
            HostErrorCode::Fail => "Method failed",
            HostErrorCode::InvalidParms => "A parameter to this method is invalid",
            HostErrorCode::OutOfMemory => "There is not enough memory to complete this method",
            HostErrorCode::InvalidCall => "This method call is not appropriate at this time",
            HostErrorCode::NotImplemented => "The requested action is not implemented",
            HostErrorCode::IdNotValid => "The passed in ID is not valid",
            HostErrorCode::StringNotFound => "String not found",
            HostErrorCode::StringBufferTooSmall => "String buffer is too small",
        }
    }
}

/// Non-zero status returned by a call-through. Unknown codes are kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostError {
    pub code: i32,
    pub kind: Option<HostErrorCode>,
}

impl HostError {
    pub fn from_code(code: i32) -> Self {
        Self {
            code,
            kind: HostErrorCode::from_u32(code as u32),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{} (0x{:08X})", kind.description(), self.code as u32),
            None => write!(f, "host error 0x{:08X}", self.code as u32),
        }
    }
}

impl std::error::Error for HostError {}

/// Map a raw call-through status to a result.
pub fn check_suite_err(code: prSuiteError) -> Result<(), SuiteError> {
    if code == suiteError_NoError {
        Ok(())
    } else {
        Err(SuiteError::Host(HostError::from_code(code)))
    }
}

impl SuiteError {
    /// `true` for errors a caller is expected to recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SuiteError::SuiteUnavailable { .. } | SuiteError::StringBufferTooSmall { .. }
        )
    }

    /// Status to report back across the entry boundary.
    pub fn to_sp_err(&self) -> SPErr {
        match self {
            SuiteError::SuiteUnavailable { .. } => kSPSuiteNotFoundError,
            SuiteError::MissingFunction(_) => kSPUnimplementedError,
            SuiteError::Host(HostError {
                kind: Some(HostErrorCode::OutOfMemory),
                ..
            }) => kSPOutOfMemoryError,
            SuiteError::Host(err) => err.code,
            _ => kSPBadParameterError,
        }
    }
}
