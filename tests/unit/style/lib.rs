/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![cfg(test)]

mod bloom;
mod dom;
mod parsing;
mod selector_map;

/// Routes `log` output through the test harness, so `RUST_LOG=style=trace`
/// works for a single failing test.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
