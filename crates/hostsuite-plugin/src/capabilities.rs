//! Startup check of the suites this plugin knows how to use.
//!
//! Hosts differ in what they serve and availability does not change within a
//! session, so each known suite is acquired and released once up front. A
//! missing suite disables the feature that needs it instead of failing later.

use hostsuite_core::{AcquisitionContext, Suite, SuiteError, SuiteName, SuiteVersion};
use tracing::{debug, warn};

/// Availability of one name/version pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteStatus {
    pub name: SuiteName,
    pub version: SuiteVersion,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    suites: Vec<SuiteStatus>,
}

impl Capabilities {
    /// Suites with a typed wrapper in this build.
    pub fn known_suites() -> Vec<(SuiteName, SuiteVersion)> {
        #[allow(unused_mut)]
        let mut known = Vec::new();
        #[cfg(feature = "string-suite")]
        known.push(entry::<hostsuite_core::ffi::PrSDKStringSuite>());
        #[cfg(feature = "premiere")]
        known.push(entry::<hostsuite_core::ffi::PF_PixelFormatSuite1>());
        known
    }

    /// Check every suite in [`known_suites`](Self::known_suites).
    pub fn detect(ctx: &AcquisitionContext) -> Result<Self, SuiteError> {
        Self::detect_suites(ctx, &Self::known_suites())
    }

    /// Acquire and immediately release each pair.
    ///
    /// # Errors
    ///
    /// Anything other than [`SuiteError::SuiteUnavailable`] aborts the check;
    /// an unavailable suite is only logged and recorded.
    pub fn detect_suites(
        ctx: &AcquisitionContext,
        suites: &[(SuiteName, SuiteVersion)],
    ) -> Result<Self, SuiteError> {
        let mut checked = Vec::with_capacity(suites.len());

        for (name, version) in suites {
            let available = match ctx.acquire(name, *version) {
                Ok(mut handle) => {
                    if let Err(err) = handle.release() {
                        warn!(%name, %version, %err, "release after availability check failed");
                    }
                    debug!(%name, %version, "suite available");
                    true
                }
                Err(SuiteError::SuiteUnavailable { .. }) => {
                    warn!(%name, %version, "suite unavailable, disabling dependent features");
                    false
                }
                Err(err) => return Err(err),
            };
            checked.push(SuiteStatus {
                name: name.clone(),
                version: *version,
                available,
            });
        }

        Ok(Self { suites: checked })
    }

    /// `false` for unchecked pairs as well as unavailable ones.
    pub fn is_available(&self, name: &SuiteName, version: SuiteVersion) -> bool {
        self.suites
            .iter()
            .any(|status| status.available && &status.name == name && status.version == version)
    }

    pub fn has<S: Suite>(&self) -> bool {
        self.is_available(&S::NAME, S::VERSION)
    }

    #[cfg(feature = "string-suite")]
    pub fn string_suite(&self) -> bool {
        self.has::<hostsuite_core::ffi::PrSDKStringSuite>()
    }

    #[cfg(feature = "premiere")]
    pub fn pixel_format_suite(&self) -> bool {
        self.has::<hostsuite_core::ffi::PF_PixelFormatSuite1>()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SuiteStatus> {
        self.suites.iter()
    }

    /// Checked suites the host did not serve.
    pub fn disabled(&self) -> impl Iterator<Item = &SuiteStatus> {
        self.suites.iter().filter(|status| !status.available)
    }
}

#[allow(dead_code)]
fn entry<S: Suite>() -> (SuiteName, SuiteVersion) {
    (S::NAME, S::VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_suites_follow_enabled_features() {
        let known = Capabilities::known_suites();
        let expected =
            usize::from(cfg!(feature = "string-suite")) + usize::from(cfg!(feature = "premiere"));
        assert_eq!(known.len(), expected);

        let has_string = known
            .iter()
            .any(|(name, _)| name.as_c_str() == hostsuite_core::ffi::kPrSDKStringSuite);
        assert_eq!(has_string, cfg!(feature = "string-suite"));
    }

    #[test]
    fn unchecked_suites_are_unavailable() {
        let caps = Capabilities::default();
        for (name, version) in Capabilities::known_suites() {
            assert!(!caps.is_available(&name, version));
        }
        assert_eq!(caps.disabled().count(), 0);
    }
}
