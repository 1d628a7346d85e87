//! Plugin entry dispatch through the exported C entry function.

use std::cell::RefCell;
use std::ffi::c_void;
use std::ptr;

use hostsuite_core::ffi::*;
use hostsuite_core::suites::{PixelFormatSuite, StringSuite};
use hostsuite_core::{AcquisitionContext, SuiteName, SuiteVersion};
use hostsuite_fake::FakeHost;
use hostsuite_plugin::{dispatch_entry, Capabilities, EntryInfo, HostPlugin};

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(event: impl Into<String>) {
    EVENTS.with(|events| events.borrow_mut().push(event.into()));
}

fn take_events() -> Vec<String> {
    EVENTS.with(|events| events.borrow_mut().drain(..).collect())
}

struct Titler {
    label: String,
}

impl HostPlugin for Titler {
    fn startup(
        ctx: &AcquisitionContext,
        entry: &EntryInfo,
        caps: &Capabilities,
    ) -> anyhow::Result<Self> {
        assert!(ctx.is_live());
        let label = if caps.string_suite() {
            let strings = StringSuite::acquire(ctx)?;
            let text = strings.new_string("Titler")?;
            text.to_rust_string()?
        } else {
            "fallback".to_owned()
        };
        record(format!(
            "startup {}.{} {:?} pixel_format={}",
            entry.major,
            entry.minor,
            entry.plugin_id,
            caps.pixel_format_suite()
        ));
        Ok(Self { label })
    }

    fn shutdown(&mut self, _ctx: &AcquisitionContext) -> anyhow::Result<()> {
        record(format!("shutdown {}", self.label));
        Ok(())
    }
}

hostsuite_plugin::define_entry_point!(titler_entry, Titler);

#[test]
fn startup_then_shutdown_through_the_entry_point() {
    let host = FakeHost::new().with_string_suite().with_pixel_format_suite();
    let mut slot: *mut c_void = ptr::null_mut();

    let plugin_id = c"com.example.titler".as_ptr();
    let err = unsafe { titler_entry(host.basic_suite(), 13, 2, plugin_id, &mut slot) };
    assert_eq!(err, kSPNoError);
    assert!(!slot.is_null());
    host.assert_balanced();
    // Availability check of both known suites plus the startup acquisition.
    assert_eq!(host.counts().acquires, 3);
    assert_eq!(host.live_strings(), 0);

    let err = unsafe { titler_entry(host.basic_suite(), 13, 2, ptr::null(), &mut slot) };
    assert_eq!(err, kSPNoError);
    assert!(slot.is_null());

    assert_eq!(
        take_events(),
        [
            "startup 13.2 Some(\"com.example.titler\") pixel_format=true",
            "shutdown Titler",
        ]
    );
}

#[test]
fn missing_suites_are_disabled_not_fatal() {
    let host = FakeHost::new();
    let mut slot: *mut c_void = ptr::null_mut();

    let err = unsafe { titler_entry(host.basic_suite(), 1, 0, ptr::null(), &mut slot) };
    assert_eq!(err, kSPNoError);
    let err = unsafe { titler_entry(host.basic_suite(), 1, 0, ptr::null(), &mut slot) };
    assert_eq!(err, kSPNoError);

    assert_eq!(
        take_events(),
        ["startup 1.0 None pixel_format=false", "shutdown fallback"]
    );
    assert_eq!(host.counts().acquires, 0);
}

#[test]
fn null_basic_suite_is_a_bad_parameter() {
    let mut slot: *mut c_void = ptr::null_mut();
    let err = unsafe { titler_entry(ptr::null(), 1, 0, ptr::null(), &mut slot) };
    assert_eq!(err, kSPBadParameterError);
    assert!(slot.is_null());
    assert!(take_events().is_empty());
}

struct NeedsPixelFormat;

impl HostPlugin for NeedsPixelFormat {
    fn startup(ctx: &AcquisitionContext, _: &EntryInfo, _: &Capabilities) -> anyhow::Result<Self> {
        let _pixels = PixelFormatSuite::acquire(ctx)?;
        Ok(Self)
    }
}

#[test]
fn suite_errors_become_their_sp_code() {
    let host = FakeHost::new().with_string_suite();
    let mut slot: *mut c_void = ptr::null_mut();

    let err = unsafe {
        dispatch_entry::<NeedsPixelFormat>(host.basic_suite(), EntryInfo::new(1, 0), &mut slot)
    };
    assert_eq!(err, kSPSuiteNotFoundError);
    assert!(slot.is_null());
    host.assert_balanced();
}

struct Panicky;

impl HostPlugin for Panicky {
    fn startup(ctx: &AcquisitionContext, _: &EntryInfo, _: &Capabilities) -> anyhow::Result<Self> {
        let _strings = StringSuite::acquire(ctx)?;
        panic!("startup exploded");
    }
}

#[test]
fn panics_are_contained_and_suites_released() {
    let host = FakeHost::new().with_string_suite();
    let mut slot: *mut c_void = ptr::null_mut();

    let err =
        unsafe { dispatch_entry::<Panicky>(host.basic_suite(), EntryInfo::new(1, 0), &mut slot) };
    assert_eq!(err, kSPLogicError);
    assert!(slot.is_null());
    host.assert_balanced();
}

#[test]
fn capabilities_detect_records_each_pair() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();
    let caps = Capabilities::detect(&ctx).unwrap();

    assert!(caps.string_suite());
    assert!(!caps.pixel_format_suite());
    assert_eq!(caps.iter().count(), Capabilities::known_suites().len());
    let disabled: Vec<_> = caps.disabled().map(|status| status.name.clone()).collect();
    assert_eq!(disabled, [SuiteName::from_static(kPFPixelFormatSuite)]);
    assert_eq!(ctx.outstanding(), 0);
}

#[test]
fn custom_suite_list_and_unchecked_pairs() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();
    let string_v2 = (SuiteName::from_static(kPrSDKStringSuite), SuiteVersion::from_const(2));
    let caps = Capabilities::detect_suites(&ctx, &[string_v2.clone()]).unwrap();

    assert!(!caps.is_available(&string_v2.0, string_v2.1));
    // Version 1 was never checked.
    assert!(!caps.string_suite());
}

#[test]
fn detect_on_dead_context_fails() {
    let host = FakeHost::new().with_string_suite();
    let ctx = host.context();
    ctx.invalidate();
    assert!(Capabilities::detect(&ctx).is_err());
}
