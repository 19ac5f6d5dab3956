/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! CSS selector parsing and matching, generic over the embedder's atoms and
//! pseudo-classes.

pub mod attr;
pub mod bloom;
pub mod builder;
pub mod context;
pub mod matching;
pub mod parser;
pub mod tree;

pub use crate::builder::{SelectorFlags, Specificity};
pub use crate::context::{MatchingContext, QuirksMode, VisitedHandlingMode};
pub use crate::parser::{AncestorHashes, Parser, SelectorImpl, SelectorList};
pub use crate::tree::{Element, OpaqueElement};
