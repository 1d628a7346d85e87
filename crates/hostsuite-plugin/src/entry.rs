//! The boundary between the host's C entry call and [`HostPlugin`].
//!
//! Nothing may unwind into the host: errors and panics are logged and turned
//! into an `SPErr` here.

use std::any::Any;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use hostsuite_core::ffi::{kSPBadParameterError, kSPLogicError, kSPNoError, SPBasicSuite, SPErr};
use hostsuite_core::{AcquisitionContext, SuiteError};
use tracing::{debug, error};

use crate::capabilities::Capabilities;
use crate::plugin::{EntryInfo, HostPlugin};

/// Run one host entry call.
///
/// While `*global_refcon` is null this starts the plugin and stores it there;
/// otherwise it takes the stored plugin back, shuts it down and clears the
/// slot. The context built from `basic` lives for this call only.
///
/// # Safety
///
/// `basic` must be null or the basic suite passed by the host for this call.
/// `global_refcon` must be null or point to a slot that is either null or
/// holds a value stored by an earlier call with the same `P`.
pub unsafe fn dispatch_entry<P: HostPlugin>(
    basic: *const SPBasicSuite,
    entry: EntryInfo,
    global_refcon: *mut *mut c_void,
) -> SPErr {
    if global_refcon.is_null() {
        error!("entry called without a global data slot");
        return kSPBadParameterError;
    }

    let ctx = match unsafe { AcquisitionContext::from_basic_suite(basic) } {
        Ok(ctx) => ctx,
        Err(err) => {
            error!(%err, "entry called without a usable basic suite");
            return err.to_sp_err();
        }
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
        run::<P>(&ctx, &entry, global_refcon)
    }));
    ctx.invalidate();

    match result {
        Ok(Ok(())) => kSPNoError,
        Ok(Err(err)) => {
            error!("plugin entry returned error: {err:#}");
            sp_err_of(&err)
        }
        Err(payload) => {
            error!("plugin entry panicked: {}", panic_message(payload.as_ref()));
            kSPLogicError
        }
    }
}

unsafe fn run<P: HostPlugin>(
    ctx: &AcquisitionContext,
    entry: &EntryInfo,
    global_refcon: *mut *mut c_void,
) -> anyhow::Result<()> {
    let slot = unsafe { &mut *global_refcon };

    if slot.is_null() {
        let caps = Capabilities::detect(ctx)?;
        let plugin = P::startup(ctx, entry, &caps)?;
        *slot = Box::into_raw(Box::new(plugin)).cast();
        debug!(major = entry.major, minor = entry.minor, "plugin started");
    } else {
        let mut plugin = unsafe { Box::from_raw(slot.cast::<P>()) };
        *slot = ptr::null_mut();
        plugin.shutdown(ctx)?;
        debug!("plugin shut down");
    }

    Ok(())
}

/// Suite errors keep their own code; anything else is a logic error.
pub fn sp_err_of(err: &anyhow::Error) -> SPErr {
    err.downcast_ref::<SuiteError>()
        .map(SuiteError::to_sp_err)
        .unwrap_or(kSPLogicError)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Export `extern "C"` entry function for a [`HostPlugin`].
///
/// ```rust,ignore
/// hostsuite_plugin::define_entry_point!(MyPlugin);
/// // or, under a different symbol name:
/// hostsuite_plugin::define_entry_point!(PluginMain, MyPlugin);
/// ```
///
/// The exported function takes the basic suite, the host's API version, an
/// optional plugin id string and the global data slot, and returns an `SPErr`.
#[macro_export]
macro_rules! define_entry_point {
    ($plugin:ty) => {
        $crate::define_entry_point!(EntryPointFunc, $plugin);
    };
    ($name:ident, $plugin:ty) => {
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            pica_basic: *const $crate::hostsuite_core::ffi::SPBasicSuite,
            major: i32,
            minor: i32,
            plugin_id: *const ::std::ffi::c_char,
            global_refcon: *mut *mut ::std::ffi::c_void,
        ) -> $crate::hostsuite_core::ffi::SPErr {
            $crate::hostsuite_core::log::init_logging();
            let entry = unsafe { $crate::EntryInfo::from_raw(major, minor, plugin_id) };
            unsafe { $crate::dispatch_entry::<$plugin>(pica_basic, entry, global_refcon) }
        }
    };
}
