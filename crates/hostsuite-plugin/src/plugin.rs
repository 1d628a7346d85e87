//! The [`HostPlugin`] trait and [`EntryInfo`], the main interface for plugins
//! built on this crate.
//!
//! The framework calls [`HostPlugin::startup`] on the first entry call and
//! keeps the plugin in the host's global data slot. The next entry call hands
//! it back and runs [`HostPlugin::shutdown`].

use std::ffi::{c_char, CStr};

use hostsuite_core::AcquisitionContext;

use crate::capabilities::Capabilities;

/// What the host told us about this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Plugin API major version the host speaks.
    pub major: i32,
    pub minor: i32,
    /// Plugin identifier from the host, if it passed one.
    pub plugin_id: Option<String>,
}

impl EntryInfo {
    pub fn new(major: i32, minor: i32) -> Self {
        Self {
            major,
            minor,
            plugin_id: None,
        }
    }

    /// Build from raw entry arguments. Non-UTF-8 ids are replaced lossily.
    ///
    /// # Safety
    ///
    /// A non-null `plugin_id` must point to a NUL-terminated string valid for
    /// the duration of the call.
    pub unsafe fn from_raw(major: i32, minor: i32, plugin_id: *const c_char) -> Self {
        let plugin_id = if plugin_id.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(plugin_id) }.to_string_lossy().into_owned())
        };
        Self {
            major,
            minor,
            plugin_id,
        }
    }
}

/// Trait for plugins that talk to the host through suites.
///
/// Every suite acquired from `ctx` must be released before the method
/// returns: the context is invalidated as soon as control goes back to the
/// host. Handles borrow `ctx`, so they cannot be stored on `self`.
///
/// # Example
///
/// ```rust,ignore
/// struct Titler {
///     label: String,
/// }
///
/// impl HostPlugin for Titler {
///     fn startup(
///         ctx: &AcquisitionContext,
///         _entry: &EntryInfo,
///         caps: &Capabilities,
///     ) -> anyhow::Result<Self> {
///         let label = if caps.string_suite() {
///             let strings = StringSuite::acquire(ctx)?;
///             strings.new_string("Titler")?.to_rust_string()?
///         } else {
///             "Titler".to_owned()
///         };
///         Ok(Self { label })
///     }
/// }
/// ```
pub trait HostPlugin: Sized + 'static {
    /// Called on the first entry call. Availability is in `caps`; suites
    /// the host lacks are already disabled there.
    fn startup(
        ctx: &AcquisitionContext,
        entry: &EntryInfo,
        caps: &Capabilities,
    ) -> anyhow::Result<Self>;

    /// Called on the entry call that unloads the plugin.
    fn shutdown(&mut self, ctx: &AcquisitionContext) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }
}
