//! # Shared state
//!
//! Components which are touched from more than one thread live behind an `Arc<Mutex<_>>`. Their
//! state is plain data, so a panic in another holder of the lock doesn't leave anything half
//! built and a poisoned lock can safely be recovered.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use std::sync::{Mutex, MutexGuard};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock the mutex, recovering the guard if another thread panicked while holding it.
pub fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(g) => g,
        Err(poisoned) => {
            warn!("{} lock was poisoned, recovering", name);
            poisoned.into_inner()
        }
    }
}
