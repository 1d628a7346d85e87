//! Suite identifiers: the name/version pair a host resolves.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;

use crate::error::SuiteError;

/// Opaque ASCII identifier of a capability table, as published by the host.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SuiteName(Cow<'static, CStr>);

impl SuiteName {
    /// Wrap a name known at compile time.
    pub const fn from_static(name: &'static CStr) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Build a name at runtime. Must be non-empty ASCII without NUL bytes.
    pub fn new(name: impl Into<String>) -> Result<Self, SuiteError> {
        let name = name.into();
        if name.is_empty() || !name.is_ascii() {
            return Err(SuiteError::InvalidName(name));
        }
        CString::new(name)
            .map(|c| Self(Cow::Owned(c)))
            .map_err(|e| {
                SuiteError::InvalidName(String::from_utf8_lossy(&e.into_vec()).into_owned())
            })
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII.
        self.0.to_str().unwrap_or_default()
    }
}

impl fmt::Debug for SuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for SuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ABI revision of a named suite. Versions start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteVersion(i32);

impl SuiteVersion {
    pub const V1: SuiteVersion = SuiteVersion(1);

    pub const fn new(version: i32) -> Option<Self> {
        if version >= 1 {
            Some(Self(version))
        } else {
            None
        }
    }

    /// Version for `const` suite declarations. Fails to compile for `version < 1`.
    pub const fn from_const(version: i32) -> Self {
        assert!(version >= 1, "suite versions start at 1");
        Self(version)
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SuiteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
