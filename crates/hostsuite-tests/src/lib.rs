//! Shared fixtures for the integration tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::rc::Rc;

use hostsuite_core::{SuiteError, SuiteHost, SuiteName, SuiteVersion};

/// Counters shared between a [`MapHost`] and the test that built it.
#[derive(Debug, Default)]
pub struct MapHostCounts {
    pub acquired: Cell<usize>,
    pub released: Cell<usize>,
}

/// Pure-Rust host serving tables from a map, with no basic suite involved.
#[derive(Default)]
pub struct MapHost {
    tables: RefCell<HashMap<(SuiteName, SuiteVersion), NonNull<c_void>>>,
    counts: Rc<MapHostCounts>,
}

impl MapHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve<T>(self, name: SuiteName, version: SuiteVersion, table: &'static T) -> Self {
        self.tables
            .borrow_mut()
            .insert((name, version), NonNull::from(table).cast());
        self
    }

    pub fn counts(&self) -> Rc<MapHostCounts> {
        self.counts.clone()
    }
}

impl SuiteHost for MapHost {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn acquire_table(
        &self,
        name: &SuiteName,
        version: SuiteVersion,
    ) -> Result<NonNull<c_void>, SuiteError> {
        let table = self
            .tables
            .borrow()
            .get(&(name.clone(), version))
            .copied()
            .ok_or_else(|| SuiteError::SuiteUnavailable {
                name: name.clone(),
                version,
            })?;
        self.counts.acquired.set(self.counts.acquired.get() + 1);
        Ok(table)
    }

    fn release_table(&self, _name: &SuiteName, _version: SuiteVersion) -> Result<(), SuiteError> {
        self.counts.released.set(self.counts.released.get() + 1);
        Ok(())
    }
}
