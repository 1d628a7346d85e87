//! The acquisition context and raw suite handles.
//!
//! An [`AcquisitionContext`] is built once from whatever the host hands over
//! at plugin entry and passed by reference to everything that needs a suite.
//! Handles borrow the context, so the borrow checker keeps them from
//! outliving the session.

use std::cell::Cell;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::{debug, warn};

use crate::error::SuiteError;
use crate::ffi::SPBasicSuite;
use crate::host::{PicaHost, SuiteHost};
use crate::name::{SuiteName, SuiteVersion};

/// Per-session access to host suites.
///
/// Not `Send`/`Sync`: acquire/release pairs stay on the thread that owns the
/// context unless a suite documents otherwise.
pub struct AcquisitionContext {
    host: Box<dyn SuiteHost>,
    live: Cell<bool>,
    outstanding: Cell<usize>,
    _single_thread: PhantomData<*const ()>,
}

impl AcquisitionContext {
    pub fn new(host: impl SuiteHost + 'static) -> Self {
        Self {
            host: Box::new(host),
            live: Cell::new(true),
            outstanding: Cell::new(0),
            _single_thread: PhantomData,
        }
    }

    /// Build a context from the basic suite passed at plugin entry.
    ///
    /// # Safety
    ///
    /// See [`PicaHost::from_raw`].
    pub unsafe fn from_basic_suite(basic: *const SPBasicSuite) -> Result<Self, SuiteError> {
        Ok(Self::new(unsafe { PicaHost::from_raw(basic) }?))
    }

    pub fn host(&self) -> &dyn SuiteHost {
        self.host.as_ref()
    }

    /// The basic-suite host, when this context talks to a real one.
    pub fn pica_host(&self) -> Option<&PicaHost> {
        self.host.as_any().downcast_ref::<PicaHost>()
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Handles acquired through this context and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    /// Resolve a table by name and version.
    pub fn acquire(
        &self,
        name: &SuiteName,
        version: SuiteVersion,
    ) -> Result<SuiteHandle<'_>, SuiteError> {
        if !self.is_live() {
            return Err(SuiteError::ContextInvalid);
        }

        let table = self.host.acquire_table(name, version)?;
        self.outstanding.set(self.outstanding.get() + 1);
        debug!(%name, %version, outstanding = self.outstanding.get(), "acquired suite");

        Ok(SuiteHandle {
            ctx: self,
            name: name.clone(),
            version,
            table,
            state: HandleState::Acquired,
        })
    }

    /// Release a handle explicitly. The handle is terminal afterwards even if
    /// the host reports a failure.
    pub fn release(&self, handle: &mut SuiteHandle<'_>) -> Result<(), SuiteError> {
        if !std::ptr::eq(handle.ctx, self) {
            return Err(SuiteError::NeverAcquired {
                name: handle.name.clone(),
                version: handle.version,
            });
        }
        if handle.state == HandleState::Released {
            return Err(SuiteError::AlreadyReleased {
                name: handle.name.clone(),
                version: handle.version,
            });
        }

        handle.state = HandleState::Released;
        self.outstanding.set(self.outstanding.get().saturating_sub(1));

        if !self.is_live() {
            // The host is gone; there is nobody left to hand the table back to.
            return Err(SuiteError::ContextInvalid);
        }

        let result = self.host.release_table(&handle.name, handle.version);
        debug!(
            name = %handle.name,
            version = %handle.version,
            outstanding = self.outstanding.get(),
            ok = result.is_ok(),
            "released suite"
        );
        result
    }

    /// Mark the session over. Later acquisitions fail with
    /// [`SuiteError::ContextInvalid`].
    pub fn invalidate(&self) {
        if !self.live.replace(false) {
            return;
        }
        let outstanding = self.outstanding.get();
        if outstanding > 0 {
            warn!(outstanding, "context invalidated with suites still acquired");
        }
    }
}

impl std::fmt::Debug for AcquisitionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionContext")
            .field("live", &self.live.get())
            .field("outstanding", &self.outstanding.get())
            .finish()
    }
}

/// Lifecycle of a [`SuiteHandle`]. A handle only comes into existence once
/// acquired, so "unacquired" is the absence of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Acquired,
    Released,
}

/// Borrowed view onto a host-owned table, released on drop.
pub struct SuiteHandle<'ctx> {
    ctx: &'ctx AcquisitionContext,
    name: SuiteName,
    version: SuiteVersion,
    table: NonNull<c_void>,
    state: HandleState,
}

impl<'ctx> SuiteHandle<'ctx> {
    pub fn name(&self) -> &SuiteName {
        &self.name
    }

    pub fn version(&self) -> SuiteVersion {
        self.version
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn context(&self) -> &'ctx AcquisitionContext {
        self.ctx
    }

    /// Table pointer, refused once the handle has been released.
    pub fn table_ptr(&self) -> Result<NonNull<c_void>, SuiteError> {
        match self.state {
            HandleState::Acquired => Ok(self.table),
            HandleState::Released => Err(SuiteError::AlreadyReleased {
                name: self.name.clone(),
                version: self.version,
            }),
        }
    }

    /// View the table as `T`.
    ///
    /// # Safety
    ///
    /// `T` must match the host's layout for this name and version.
    pub unsafe fn table<T>(&self) -> Result<&T, SuiteError> {
        Ok(unsafe { self.table_ptr()?.cast::<T>().as_ref() })
    }

    /// Release through the owning context.
    pub fn release(&mut self) -> Result<(), SuiteError> {
        let ctx = self.ctx;
        ctx.release(self)
    }

    pub(crate) fn raw_table(&self) -> NonNull<c_void> {
        self.table
    }
}

impl std::fmt::Debug for SuiteHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteHandle")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for SuiteHandle<'_> {
    fn drop(&mut self) {
        if self.state == HandleState::Released {
            return;
        }
        if let Err(err) = self.release() {
            if err != SuiteError::ContextInvalid {
                warn!(
                    name = %self.name,
                    version = %self.version,
                    %err,
                    "releasing suite on drop failed"
                );
            }
        }
    }
}
