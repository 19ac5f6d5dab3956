/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Where rules that fail to parse get reported. Dropping a rule is never
//! fatal, so reporters only observe.

#![deny(missing_docs)]

use cssparser::SourceLocation;
use log::{info, log_enabled, Level};
use parking_lot::Mutex;
use selectors::parser::SelectorParseError;
use std::fmt;

/// A problem found while adding rules to a stylist.
#[derive(Debug)]
pub enum ContextualParseError<'a> {
    /// The selector text of a dropped rule, and why it was dropped.
    InvalidRule(&'a str, SelectorParseError<'a>),
}

impl fmt::Display for ContextualParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ContextualParseError::InvalidRule(text, ref error) = *self;
        write!(f, "Invalid rule: '{}', {:?}", text, error.kind)
    }
}

/// Receives every `ContextualParseError`, with where in the source it happened.
pub trait ParseErrorReporter: Sync + Send {
    /// Observes one error.
    fn report_error(&self, location: SourceLocation, error: ContextualParseError);
}

/// Reports through `log` at `info` level, so nothing shows unless something
/// like `RUST_LOG=style=info` asks for it.
pub struct RustLogReporter;

impl ParseErrorReporter for RustLogReporter {
    fn report_error(&self, location: SourceLocation, error: ContextualParseError) {
        if !log_enabled!(Level::Info) {
            return;
        }
        info!("{}:{} {}", location.line, location.column, error);
    }
}

/// Keeps every message, for assertions.
#[derive(Default)]
pub struct TestingErrorReporter {
    reported: Mutex<Vec<(u32, u32, String)>>,
}

impl TestingErrorReporter {
    /// A reporter that has seen nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains what was reported, as `(line, column, message)`.
    pub fn take_errors(&self) -> Vec<(u32, u32, String)> {
        std::mem::take(&mut *self.reported.lock())
    }
}

impl ParseErrorReporter for TestingErrorReporter {
    fn report_error(&self, location: SourceLocation, error: ContextualParseError) {
        let message = error.to_string();
        self.reported.lock().push((location.line, location.column, message));
    }
}
