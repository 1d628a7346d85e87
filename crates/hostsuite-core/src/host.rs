//! The seam between suite bookkeeping and the host that actually owns tables.

use std::ffi::c_void;
use std::ptr::{self, NonNull};

use tracing::{debug, trace, warn};

use crate::error::{HostError, SuiteError};
use crate::ffi::{kSPNoError, SPBasicSuite};
use crate::name::{SuiteName, SuiteVersion};

/// A host that resolves named, versioned function-pointer tables.
///
/// [`PicaHost`] talks to a real host through its basic suite. Tests can
/// substitute any implementation that honours the same contract.
pub trait SuiteHost {
    /// Downcast to a concrete host (e.g. to reach [`PicaHost::allocate_block`]).
    fn as_any(&self) -> &dyn std::any::Any;

    /// Resolve a table. Must either return a valid table pointer or fail
    /// without retaining a reference on the host side.
    fn acquire_table(
        &self,
        name: &SuiteName,
        version: SuiteVersion,
    ) -> Result<NonNull<c_void>, SuiteError>;

    /// Drop the reference taken by a successful [`acquire_table`](Self::acquire_table).
    fn release_table(&self, name: &SuiteName, version: SuiteVersion) -> Result<(), SuiteError>;
}

/// Host reached through the `SPBasicSuite` pointer handed over at plugin entry.
#[derive(Debug)]
pub struct PicaHost {
    basic: NonNull<SPBasicSuite>,
}

impl PicaHost {
    /// Wrap the basic suite pointer from the entry call.
    ///
    /// # Safety
    ///
    /// A non-null `basic` must point to a basic suite that stays valid for the
    /// lifetime of the returned value.
    pub unsafe fn from_raw(basic: *const SPBasicSuite) -> Result<Self, SuiteError> {
        let basic = NonNull::new(basic as *mut SPBasicSuite).ok_or(SuiteError::ContextInvalid)?;
        let table = unsafe { basic.as_ref() };
        if table.AcquireSuite.is_none() || table.ReleaseSuite.is_none() {
            return Err(SuiteError::ContextInvalid);
        }
        Ok(Self { basic })
    }

    pub fn as_ptr(&self) -> *const SPBasicSuite {
        self.basic.as_ptr()
    }

    fn table(&self) -> &SPBasicSuite {
        // Valid per the `from_raw` contract.
        unsafe { self.basic.as_ref() }
    }

    /// Allocate `size` bytes of host memory, freed when the block drops.
    pub fn allocate_block(&self, size: usize) -> Result<HostBlock<'_>, SuiteError> {
        let allocate = self
            .table()
            .AllocateBlock
            .ok_or(SuiteError::MissingFunction("AllocateBlock"))?;
        if self.table().FreeBlock.is_none() {
            return Err(SuiteError::MissingFunction("FreeBlock"));
        }

        let mut block: *mut c_void = ptr::null_mut();
        let err = unsafe { allocate(size, &mut block) };
        match NonNull::new(block) {
            Some(ptr) if err == kSPNoError => {
                // The host makes no promise about initial contents.
                unsafe { ptr::write_bytes(ptr.as_ptr().cast::<u8>(), 0, size) };
                trace!(size, "allocated host block");
                Ok(HostBlock {
                    host: self,
                    ptr: ptr.cast(),
                    len: size,
                })
            }
            Some(stray) => {
                // Failed but handed out memory anyway; it is still ours to free.
                debug!(size, err, "host returned a block alongside an error");
                self.free_block(stray.as_ptr());
                Err(SuiteError::Host(HostError::from_code(err)))
            }
            None => Err(SuiteError::Host(HostError::from_code(err))),
        }
    }

    fn free_block(&self, block: *mut c_void) {
        if let Some(free) = self.table().FreeBlock {
            let err = unsafe { free(block) };
            if err != kSPNoError {
                warn!(err, "host refused to free block");
            }
        }
    }
}

impl SuiteHost for PicaHost {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn acquire_table(
        &self,
        name: &SuiteName,
        version: SuiteVersion,
    ) -> Result<NonNull<c_void>, SuiteError> {
        let acquire = self
            .table()
            .AcquireSuite
            .ok_or(SuiteError::MissingFunction("AcquireSuite"))?;

        let mut suite: *const c_void = ptr::null();
        let err = unsafe { acquire(name.as_c_str().as_ptr(), version.get(), &mut suite) };

        match NonNull::new(suite as *mut c_void) {
            Some(table) if err == kSPNoError => Ok(table),
            // A failed acquire holds no reference, whatever the host wrote to
            // `suite`. Releasing here would drop one owned by a live handle.
            _ => {
                debug!(%name, %version, err, "suite not served");
                Err(SuiteError::SuiteUnavailable {
                    name: name.clone(),
                    version,
                })
            }
        }
    }

    fn release_table(&self, name: &SuiteName, version: SuiteVersion) -> Result<(), SuiteError> {
        let release = self
            .table()
            .ReleaseSuite
            .ok_or(SuiteError::MissingFunction("ReleaseSuite"))?;

        let err = unsafe { release(name.as_c_str().as_ptr(), version.get()) };
        if err == kSPNoError {
            Ok(())
        } else {
            Err(SuiteError::Host(HostError::from_code(err)))
        }
    }
}

/// Host-allocated memory, returned to the host on drop.
pub struct HostBlock<'h> {
    host: &'h PicaHost,
    ptr: NonNull<u8>,
    len: usize,
}

impl HostBlock<'_> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for HostBlock<'_> {
    fn drop(&mut self) {
        self.host.free_block(self.ptr.as_ptr().cast());
    }
}
