//! Typed wrappers for the suites this crate knows the layout of.
//!
//! Which wrappers exist is a build-time choice: each host variant serves a
//! different capability set, selected with Cargo features.

#[cfg(feature = "string-suite")]
pub mod string;
#[cfg(feature = "string-suite")]
pub use string::{SdkString, StringSuite};

#[cfg(feature = "premiere")]
pub mod pixel_format;
#[cfg(feature = "premiere")]
pub use pixel_format::{EffectRef, PixelFormat, PixelFormatSuite};
