//! Instrumented fake host for exercising suite access without a real host.
//!
//! [`FakeHost`] serves a real C-ABI basic suite, so plugin code under test
//! goes through the same `AcquireSuite`/`ReleaseSuite` calls it would make in
//! production. Every acquisition and release is counted; dropping an
//! unbalanced host fails the test.
//!
//! The basic suite carries no user data pointer, so the table is a `static`
//! and the state it reaches is installed per thread. Installing a host saves
//! the previous one and dropping it restores it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr, CString};
use std::rc::Rc;

use hostsuite_core::ffi::*;
use hostsuite_core::AcquisitionContext;
use tracing::trace;

#[cfg(feature = "premiere")]
mod pixel_format;
mod string;

#[cfg(feature = "premiere")]
pub use pixel_format::FAKE_PIXEL_FORMAT_SUITE;
pub use string::FAKE_STRING_SUITE;

type SuiteKey = (CString, i32);

#[derive(Default)]
pub(crate) struct FakeState {
    served: HashMap<SuiteKey, usize>,
    refs: HashMap<SuiteKey, usize>,
    acquires: usize,
    releases: usize,
    rejected_releases: usize,
    blocks: HashMap<usize, Box<[u8]>>,
    acquire_failure: Option<SPErr>,
    allocation_failure: Option<SPErr>,
    pub(crate) strings: Vec<Option<String>>,
    pub(crate) supported_pixel_formats: Vec<PrPixelFormat>,
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<RefCell<FakeState>>>> = const { RefCell::new(None) };
}

/// Run `f` against the host installed on this thread, if any.
pub(crate) fn with_state<R>(f: impl FnOnce(&mut FakeState) -> R) -> Option<R> {
    CURRENT.with(|current| {
        let state = current.borrow().clone()?;
        let mut state = state.borrow_mut();
        Some(f(&mut state))
    })
}

/// Snapshot of the host-side counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub acquires: usize,
    pub releases: usize,
    pub rejected_releases: usize,
    pub outstanding: usize,
}

pub struct FakeHost {
    state: Rc<RefCell<FakeState>>,
    previous: Option<Rc<RefCell<FakeState>>>,
    check_on_drop: bool,
}

impl FakeHost {
    /// Install an empty host on this thread. It serves no suites until told to.
    pub fn new() -> Self {
        let state = Rc::new(RefCell::new(FakeState::default()));
        let previous = CURRENT.with(|current| current.replace(Some(state.clone())));
        Self {
            state,
            previous,
            check_on_drop: true,
        }
    }

    /// Serve `table` under `name`/`version`.
    pub fn serve<T>(self, name: &CStr, version: i32, table: &'static T) -> Self {
        self.state
            .borrow_mut()
            .served
            .insert((name.to_owned(), version), table as *const T as usize);
        self
    }

    /// Serve the fake string-interchange suite.
    pub fn with_string_suite(self) -> Self {
        self.serve(kPrSDKStringSuite, kPrSDKStringSuiteVersion, &FAKE_STRING_SUITE)
    }

    /// Serve the fake pixel format suite, as the video editing host does.
    #[cfg(feature = "premiere")]
    pub fn with_pixel_format_suite(self) -> Self {
        self.serve(kPFPixelFormatSuite, kPFPixelFormatSuiteVersion1, &FAKE_PIXEL_FORMAT_SUITE)
    }

    /// Make the next acquisition of a served suite fail with `code` after
    /// writing the table pointer anyway, as some hosts do. No reference is
    /// taken.
    pub fn fail_next_acquire(&self, code: SPErr) {
        self.state.borrow_mut().acquire_failure = Some(code);
    }

    /// Make the next block allocation fail with `code` while still handing
    /// out a (tracked) block.
    pub fn fail_next_allocation(&self, code: SPErr) {
        self.state.borrow_mut().allocation_failure = Some(code);
    }

    /// Skip the balance check on drop, for tests that leak on purpose.
    pub fn disarm(mut self) -> Self {
        self.check_on_drop = false;
        self
    }

    /// The basic suite a real host would pass at plugin entry.
    pub fn basic_suite(&self) -> *const SPBasicSuite {
        &FAKE_BASIC_SUITE
    }

    /// A context talking to this host through its basic suite.
    pub fn context(&self) -> AcquisitionContext {
        // The basic suite is a static; calls made after this host is dropped
        // fail with `kSPBadParameterError` instead of dangling.
        match unsafe { AcquisitionContext::from_basic_suite(self.basic_suite()) } {
            Ok(ctx) => ctx,
            Err(err) => unreachable!("fake basic suite is complete: {err}"),
        }
    }

    pub fn counts(&self) -> Counts {
        let state = self.state.borrow();
        Counts {
            acquires: state.acquires,
            releases: state.releases,
            rejected_releases: state.rejected_releases,
            outstanding: state.refs.values().sum(),
        }
    }

    /// References currently held on one suite.
    pub fn refs(&self, name: &CStr, version: i32) -> usize {
        self.state
            .borrow()
            .refs
            .get(&(name.to_owned(), version))
            .copied()
            .unwrap_or(0)
    }

    /// Host strings allocated and not yet disposed.
    pub fn live_strings(&self) -> usize {
        self.state.borrow().strings.iter().filter(|s| s.is_some()).count()
    }

    pub fn live_blocks(&self) -> usize {
        self.state.borrow().blocks.len()
    }

    pub fn supported_pixel_formats(&self) -> Vec<PrPixelFormat> {
        self.state.borrow().supported_pixel_formats.clone()
    }

    /// Panic unless every acquisition was released exactly once.
    pub fn assert_balanced(&self) {
        let counts = self.counts();
        assert_eq!(
            counts.acquires, counts.releases,
            "suite acquisitions and releases diverge: {counts:?}"
        );
        assert_eq!(counts.outstanding, 0, "suites still acquired: {counts:?}");
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FakeHost {
    fn drop(&mut self) {
        CURRENT.with(|current| current.replace(self.previous.take()));
        if self.check_on_drop && !std::thread::panicking() {
            self.assert_balanced();
        }
    }
}

// =====================================================================
// Basic suite
// =====================================================================

// `IsEqual` and `ReallocateBlock` stay empty: nothing on the plugin side calls them.
static FAKE_BASIC_SUITE: SPBasicSuite = SPBasicSuite {
    AcquireSuite: Some(fake_acquire_suite),
    ReleaseSuite: Some(fake_release_suite),
    IsEqual: None,
    AllocateBlock: Some(fake_allocate_block),
    FreeBlock: Some(fake_free_block),
    ReallocateBlock: None,
    Undefined: None,
};

unsafe fn suite_key(name: *const c_char, version: i32) -> Option<SuiteKey> {
    if name.is_null() {
        return None;
    }
    Some((unsafe { CStr::from_ptr(name) }.to_owned(), version))
}

unsafe extern "C" fn fake_acquire_suite(
    name: *const c_char,
    version: i32,
    suite: *mut *const c_void,
) -> SPErr {
    if suite.is_null() {
        return kSPBadParameterError;
    }
    unsafe { *suite = std::ptr::null() };
    let Some(key) = (unsafe { suite_key(name, version) }) else {
        return kSPBadParameterError;
    };

    with_state(|state| match state.served.get(&key).copied() {
        Some(table) => {
            unsafe { *suite = table as *const c_void };
            if let Some(code) = state.acquire_failure.take() {
                return code;
            }
            state.acquires += 1;
            *state.refs.entry(key).or_default() += 1;
            kSPNoError
        }
        None => {
            trace!(name = ?key.0, version, "fake host does not serve suite");
            kSPSuiteNotFoundError
        }
    })
    .unwrap_or(kSPBadParameterError)
}

unsafe extern "C" fn fake_release_suite(name: *const c_char, version: i32) -> SPErr {
    let Some(key) = (unsafe { suite_key(name, version) }) else {
        return kSPBadParameterError;
    };

    with_state(|state| match state.refs.get_mut(&key) {
        Some(refs) if *refs > 0 => {
            *refs -= 1;
            state.releases += 1;
            kSPNoError
        }
        _ => {
            state.rejected_releases += 1;
            kSPBadParameterError
        }
    })
    .unwrap_or(kSPBadParameterError)
}

unsafe extern "C" fn fake_allocate_block(size: usize, block: *mut *mut c_void) -> SPErr {
    if block.is_null() {
        return kSPBadParameterError;
    }
    with_state(|state| {
        let mut bytes = vec![0xA5u8; size.max(1)].into_boxed_slice();
        let ptr = bytes.as_mut_ptr();
        state.blocks.insert(ptr as usize, bytes);
        unsafe { *block = ptr.cast() };
        state.allocation_failure.take().unwrap_or(kSPNoError)
    })
    .unwrap_or(kSPBadParameterError)
}

unsafe extern "C" fn fake_free_block(block: *mut c_void) -> SPErr {
    with_state(|state| match state.blocks.remove(&(block as usize)) {
        Some(_) => kSPNoError,
        None => kSPBadParameterError,
    })
    .unwrap_or(kSPBadParameterError)
}
