//! Test utilities for the lead-sync crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! when the `test-support` feature is enabled.

pub mod crm;
pub mod repositories;

use std::sync::{Mutex, MutexGuard};

pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, label: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{label} mutex poisoned"),
    }
}
