/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Calculate [specified][specified] and [computed values][computed] from a
//! tree of DOM nodes and a set of stylesheets.
//!
//! This crate is the embedder side of the `selectors` crate: it fixes the
//! atoms, pseudo-classes and pseudo-elements selectors are parsed into, and
//! indexes style rules so that the ones that apply to an element can be found
//! quickly.
//!
//! [specified]: https://drafts.csswg.org/css-cascade/#specified
//! [computed]: https://drafts.csswg.org/css-cascade/#computed

#![deny(missing_docs)]

pub mod atoms;
pub mod bloom;
pub mod dom;
pub mod error_reporting;
pub mod recycler;
pub mod rule;
pub mod selector_map;
pub mod selector_parser;
pub mod stylist;

pub use crate::atoms::{Atom, LocalName, Namespace, Prefix};
