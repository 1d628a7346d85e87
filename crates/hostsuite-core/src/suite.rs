//! Typed suites: a raw table struct plus the name/version it is served under.

use std::marker::PhantomData;

use crate::context::{AcquisitionContext, SuiteHandle};
use crate::error::SuiteError;
use crate::name::{SuiteName, SuiteVersion};

/// A host function-pointer table with a fixed name and version.
///
/// # Safety
///
/// `Self` must have exactly the layout the host uses for `NAME`/`VERSION`.
pub unsafe trait Suite: Sized + 'static {
    const NAME: SuiteName;
    const VERSION: SuiteVersion;
}

/// Typed, scoped ownership of an acquired table.
///
/// [`release`](Self::release) consumes the value, so calling through a
/// released table does not compile. Dropping releases as well.
pub struct Acquired<'ctx, S: Suite> {
    handle: SuiteHandle<'ctx>,
    _table: PhantomData<&'ctx S>,
}

impl<'ctx, S: Suite> Acquired<'ctx, S> {
    pub fn acquire(ctx: &'ctx AcquisitionContext) -> Result<Self, SuiteError> {
        let handle = ctx.acquire(&S::NAME, S::VERSION)?;
        Ok(Self {
            handle,
            _table: PhantomData,
        })
    }

    pub fn table(&self) -> &S {
        // Acquired for as long as `self` exists; layout promised by `Suite`.
        unsafe { self.handle.raw_table().cast::<S>().as_ref() }
    }

    pub fn context(&self) -> &'ctx AcquisitionContext {
        self.handle.context()
    }

    pub fn release(mut self) -> Result<(), SuiteError> {
        self.handle.release()
    }
}

impl AcquisitionContext {
    /// Acquire a typed suite.
    pub fn suite<S: Suite>(&self) -> Result<Acquired<'_, S>, SuiteError> {
        Acquired::acquire(self)
    }

    /// Acquire `S` if the host serves it. Other errors still propagate.
    pub fn optional_suite<S: Suite>(&self) -> Result<Option<Acquired<'_, S>>, SuiteError> {
        match Acquired::acquire(self) {
            Ok(suite) => Ok(Some(suite)),
            Err(SuiteError::SuiteUnavailable { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Declare a raw table as a [`Suite`] and generate a named wrapper around
/// [`Acquired`].
#[macro_export]
macro_rules! define_suite {
    ($(#[$attr:meta])* $wrapper:ident, $table:ty, $name:expr, $version:expr) => {
        unsafe impl $crate::Suite for $table {
            const NAME: $crate::SuiteName = $crate::SuiteName::from_static($name);
            const VERSION: $crate::SuiteVersion = $crate::SuiteVersion::from_const($version);
        }

        $(#[$attr])*
        pub struct $wrapper<'ctx> {
            suite: $crate::Acquired<'ctx, $table>,
        }

        impl<'ctx> $wrapper<'ctx> {
            /// Acquire this suite from the host. Released on drop.
            pub fn acquire(
                ctx: &'ctx $crate::AcquisitionContext,
            ) -> Result<Self, $crate::SuiteError> {
                Ok(Self {
                    suite: $crate::Acquired::acquire(ctx)?,
                })
            }

            /// Release now instead of at drop, surfacing the host's answer.
            pub fn release(self) -> Result<(), $crate::SuiteError> {
                self.suite.release()
            }

            pub fn table(&self) -> &$table {
                self.suite.table()
            }

            pub fn context(&self) -> &'ctx $crate::AcquisitionContext {
                self.suite.context()
            }
        }
    };
}

/// Call a table entry, failing with [`SuiteError::MissingFunction`] when the
/// host left it empty. Evaluates to the entry's raw return value.
#[macro_export]
macro_rules! call_suite_fn {
    ($suite:expr, $function:ident $(, $arg:expr)* $(,)?) => {{
        // Copy the pointer out first: tables may be packed.
        let function = { $suite.table().$function }
            .ok_or($crate::SuiteError::MissingFunction(stringify!($function)))?;
        #[allow(unused_unsafe)]
        unsafe {
            function($($arg),*)
        }
    }};
}
