//! Acquire/release bookkeeping against the instrumented fake host.

use std::ffi::{c_char, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};

use hostsuite_core::ffi::*;
use hostsuite_core::suites::{PixelFormatSuite, StringSuite};
use hostsuite_core::{AcquisitionContext, HandleState, SuiteError, SuiteName, SuiteVersion};
use hostsuite_fake::FakeHost;

const STRING_SUITE: SuiteName = SuiteName::from_static(kPrSDKStringSuite);
const PIXEL_FORMAT_SUITE: SuiteName = SuiteName::from_static(kPFPixelFormatSuite);

fn full_host() -> FakeHost {
    FakeHost::new().with_string_suite().with_pixel_format_suite()
}

#[test]
fn advertised_pairs_can_be_reacquired_after_release() {
    let host = full_host();
    let ctx = host.context();

    for name in [&STRING_SUITE, &PIXEL_FORMAT_SUITE] {
        let mut first = ctx.acquire(name, SuiteVersion::V1).unwrap();
        first.release().unwrap();
        let mut second = ctx.acquire(name, SuiteVersion::V1).unwrap();
        second.release().unwrap();
    }

    assert_eq!(host.counts().acquires, 4);
    assert_eq!(host.counts().releases, 4);
}

#[test]
fn unadvertised_pairs_are_unavailable() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();

    let cases = [
        (PIXEL_FORMAT_SUITE.clone(), SuiteVersion::V1),
        (STRING_SUITE.clone(), SuiteVersion::from_const(2)),
        (SuiteName::new("Nonexistent Suite").unwrap(), SuiteVersion::V1),
    ];
    for (name, version) in cases {
        let err = ctx.acquire(&name, version).unwrap_err();
        assert_eq!(err, SuiteError::SuiteUnavailable { name, version });
        assert!(err.is_recoverable());
    }

    assert_eq!(host.counts().acquires, 0);
    assert_eq!(ctx.outstanding(), 0);
}

#[test]
fn scoped_handles_balance_acquires_and_releases() {
    let host = full_host();
    let ctx = host.context();

    {
        let _strings = StringSuite::acquire(&ctx).unwrap();
        let _pixels = PixelFormatSuite::acquire(&ctx).unwrap();
        let _raw = ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap();
        assert_eq!(host.refs(kPrSDKStringSuite, 1), 2);
        assert_eq!(host.counts().outstanding, 3);
    }

    host.assert_balanced();
    assert_eq!(host.counts().acquires, 3);
}

#[test]
fn early_return_still_releases() {
    fn fails_halfway(ctx: &AcquisitionContext) -> Result<(), SuiteError> {
        let _strings = StringSuite::acquire(ctx)?;
        Err(SuiteError::InteriorNul)
    }

    let host = full_host();
    let ctx = host.context();
    assert_eq!(fails_halfway(&ctx), Err(SuiteError::InteriorNul));
    host.assert_balanced();
}

#[test]
#[should_panic(expected = "acquisitions and releases diverge")]
fn leaked_handle_fails_at_host_scope_exit() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();
    std::mem::forget(ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap());
    drop(host);
}

#[test]
fn double_release_is_rejected_without_touching_counts() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();

    let mut handle = ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap();
    handle.release().unwrap();
    assert_eq!(
        handle.release(),
        Err(SuiteError::AlreadyReleased {
            name: STRING_SUITE,
            version: SuiteVersion::V1
        })
    );
    assert_eq!(ctx.release(&mut handle).unwrap_err(), handle.release().unwrap_err());
    drop(handle);

    let counts = host.counts();
    assert_eq!((counts.acquires, counts.releases, counts.rejected_releases), (1, 1, 0));
}

#[test]
fn released_raw_handle_refuses_call_through() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();

    let mut handle = ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap();
    assert!(unsafe { handle.table::<PrSDKStringSuite>() }.is_ok());
    handle.release().unwrap();

    assert_eq!(handle.state(), HandleState::Released);
    assert!(matches!(
        unsafe { handle.table::<PrSDKStringSuite>() },
        Err(SuiteError::AlreadyReleased { .. })
    ));
}

#[test]
fn handle_from_another_context_is_refused() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();
    let other = host.context();

    let mut handle = ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap();
    assert!(matches!(other.release(&mut handle), Err(SuiteError::NeverAcquired { .. })));
    assert_eq!(handle.state(), HandleState::Acquired);
    drop(handle);
    host.assert_balanced();
}

#[test]
fn invalidated_context_refuses_new_acquisitions() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();
    ctx.invalidate();

    assert_eq!(StringSuite::acquire(&ctx).err(), Some(SuiteError::ContextInvalid));
    assert_eq!(ctx.optional_suite::<PrSDKStringSuite>().err(), Some(SuiteError::ContextInvalid));
    assert_eq!(host.counts().acquires, 0);
}

#[test]
fn optional_suite_distinguishes_absent_from_present() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();

    assert!(ctx.optional_suite::<PF_PixelFormatSuite1>().unwrap().is_none());
    let strings = ctx.optional_suite::<PrSDKStringSuite>().unwrap();
    assert!(strings.is_some());
    drop(strings);
    host.assert_balanced();
}

#[test]
fn same_suite_can_be_held_twice() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();

    let a = StringSuite::acquire(&ctx).unwrap();
    let b = StringSuite::acquire(&ctx).unwrap();
    assert_eq!(ctx.outstanding(), 2);
    a.release().unwrap();
    assert_eq!(host.refs(kPrSDKStringSuite, 1), 1);
    b.release().unwrap();
    host.assert_balanced();
}

#[test]
fn pica_host_is_reachable_from_fake_context() {
    let host = FakeHost::new();
    let ctx = host.context();
    let pica = ctx.pica_host().expect("fake context uses the basic suite");
    assert_eq!(pica.as_ptr(), host.basic_suite());
}

// A host that reports failure but still writes a table pointer.

static STRAY_RELEASES: AtomicUsize = AtomicUsize::new(0);
static STRAY_TABLE: [usize; 1] = [0];

unsafe extern "C" fn stray_acquire(
    _name: *const c_char,
    _version: i32,
    suite: *mut *const c_void,
) -> SPErr {
    unsafe { *suite = STRAY_TABLE.as_ptr().cast() };
    kSPBadParameterError
}

unsafe extern "C" fn stray_release(_name: *const c_char, _version: i32) -> SPErr {
    STRAY_RELEASES.fetch_add(1, Ordering::SeqCst);
    kSPNoError
}

static STRAY_BASIC_SUITE: SPBasicSuite = SPBasicSuite {
    AcquireSuite: Some(stray_acquire),
    ReleaseSuite: Some(stray_release),
    IsEqual: None,
    AllocateBlock: None,
    FreeBlock: None,
    ReallocateBlock: None,
    Undefined: None,
};

#[test]
fn table_returned_with_error_is_not_released() {
    let ctx = unsafe { AcquisitionContext::from_basic_suite(&STRAY_BASIC_SUITE) }.unwrap();
    let err = ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap_err();
    assert!(matches!(err, SuiteError::SuiteUnavailable { .. }));
    assert_eq!(STRAY_RELEASES.load(Ordering::SeqCst), 0);
    assert_eq!(ctx.outstanding(), 0);
}

#[test]
fn failed_acquire_leaves_live_handle_reference_alone() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();

    let mut live = ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap();
    host.fail_next_acquire(kSPOutOfMemoryError);
    let err = ctx.acquire(&STRING_SUITE, SuiteVersion::V1).unwrap_err();
    assert!(matches!(err, SuiteError::SuiteUnavailable { .. }));

    assert_eq!(host.refs(kPrSDKStringSuite, kPrSDKStringSuiteVersion), 1);
    assert_eq!(host.counts().rejected_releases, 0);
    assert_eq!(ctx.outstanding(), 1);

    live.release().unwrap();
    assert_eq!(host.counts().rejected_releases, 0);
    host.assert_balanced();
}

#[test]
fn basic_suite_without_acquire_is_not_a_context() {
    static INCOMPLETE: SPBasicSuite = SPBasicSuite {
        AcquireSuite: None,
        ReleaseSuite: Some(stray_release),
        IsEqual: None,
        AllocateBlock: None,
        FreeBlock: None,
        ReallocateBlock: None,
        Undefined: None,
    };

    assert_eq!(
        unsafe { AcquisitionContext::from_basic_suite(&INCOMPLETE) }.unwrap_err(),
        SuiteError::ContextInvalid
    );
    assert_eq!(
        unsafe { AcquisitionContext::from_basic_suite(std::ptr::null()) }.unwrap_err(),
        SuiteError::ContextInvalid
    );
}

static_assertions::assert_not_impl_any!(AcquisitionContext: Send, Sync);
static_assertions::assert_not_impl_any!(StringSuite<'static>: Send, Sync);
