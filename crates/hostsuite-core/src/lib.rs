//! Suite-table access for host plugin SDKs.
//!
//! Hosts expose their functionality as named, versioned tables of function
//! pointers ("suites"). A plugin resolves each table at runtime through the
//! host's basic suite, calls through it, and must hand it back exactly once.
//!
//! - [`AcquisitionContext`] is built at plugin entry and passed by reference.
//! - [`SuiteHandle`] is a raw, runtime-checked handle for any name/version.
//! - [`Acquired`] and the wrappers made by [`define_suite!`] are typed handles
//!   whose release consumes them.
//! - [`ffi`] holds the hard-coded table layouts.

pub mod context;
pub mod error;
pub mod ffi;
pub mod host;
pub mod log;
pub mod name;
pub mod suite;
pub mod suites;

pub use context::{AcquisitionContext, HandleState, SuiteHandle};
pub use error::{check_suite_err, HostError, HostErrorCode, SuiteError};
pub use host::{HostBlock, PicaHost, SuiteHost};
pub use name::{SuiteName, SuiteVersion};
pub use suite::{Acquired, Suite};
