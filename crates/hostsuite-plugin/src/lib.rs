//! Plugin-side framework over [`hostsuite_core`].
//!
//! Plugin authors implement [`HostPlugin`] and export it with
//! [`define_entry_point!`]. Each host call into the plugin gets its own
//! [`AcquisitionContext`](hostsuite_core::AcquisitionContext), built from the
//! basic suite the host passes and invalidated before control returns.
//!
//! # Overview
//!
//! - [`HostPlugin`] is the trait plugin authors implement.
//! - [`EntryInfo`] describes the host call (API version, plugin id).
//! - [`Capabilities`] records which known suites the host serves.
//! - [`dispatch_entry`] is what the exported entry function calls.

pub mod capabilities;
pub mod entry;
pub mod plugin;

pub use capabilities::Capabilities;
pub use entry::dispatch_entry;
pub use plugin::{EntryInfo, HostPlugin};

// Used by `define_entry_point!`.
#[doc(hidden)]
pub use hostsuite_core;
