/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A one-slot pool for scratch buffers that are needed once per call.

use parking_lot::Mutex;
use std::fmt;

/// Keeps at most one spare `T` around so that repeated calls don't allocate.
///
/// A value handed back through `release` is reset first, so whatever
/// `acquire` returns is always in its initial state.
pub struct Recycler<T> {
    spare: Mutex<Option<T>>,
    factory: fn() -> T,
    reset: fn(&mut T),
}

impl<T> Recycler<T> {
    /// Creates an empty pool.
    pub fn new(factory: fn() -> T, reset: fn(&mut T)) -> Self {
        Recycler {
            spare: Mutex::new(None),
            factory,
            reset,
        }
    }

    /// Takes the spare value, or makes a new one if another caller holds it.
    pub fn acquire(&self) -> T {
        self.spare.lock().take().unwrap_or_else(self.factory)
    }

    /// Resets `value` and keeps it for the next `acquire`, unless a spare is
    /// already stored.
    pub fn release(&self, mut value: T) {
        (self.reset)(&mut value);
        let mut spare = self.spare.lock();
        if spare.is_none() {
            *spare = Some(value);
        }
    }
}

impl<T> fmt::Debug for Recycler<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Recycler")
            .field("has_spare", &self.spare.lock().is_some())
            .finish()
    }
}
