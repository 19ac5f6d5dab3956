/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Immutable strings with a hash computed once at construction.
//!
//! Names, ids, classes and namespace URLs are compared and hashed far more
//! often than they are created, so they carry their hash around. The hash is
//! what the selector bloom filter and the rule hash maps consume.

use cssparser::{serialize_identifier, ToCss};
use precomputed_hash::PrecomputedHash;
use rustc_hash::FxHasher;
use servo_arc::Arc;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

struct AtomData {
    string: Box<str>,
    hash: u32,
}

/// A shared, immutable string with a precomputed hash.
#[derive(Clone)]
pub struct Atom(Arc<AtomData>);

fn hash_str(string: &str) -> u32 {
    let mut hasher = FxHasher::default();
    hasher.write(string.as_bytes());
    hasher.finish() as u32
}

impl Atom {
    /// Creates an atom, hashing `string`.
    pub fn new(string: &str) -> Self {
        Atom(Arc::new(AtomData {
            string: string.into(),
            hash: hash_str(string),
        }))
    }

    /// The hash of this atom.
    #[inline]
    pub fn get_hash(&self) -> u32 {
        self.0.hash
    }

    /// Returns the ASCII-lowercase version of this atom, sharing the
    /// allocation when it's already lowercase.
    pub fn to_ascii_lowercase(&self) -> Self {
        if self.0.string.bytes().any(|b| b.is_ascii_uppercase()) {
            Atom::new(&self.0.string.to_ascii_lowercase())
        } else {
            self.clone()
        }
    }

    /// Whether two atoms are equal ignoring ASCII case.
    pub fn eq_ignore_ascii_case(&self, other: &Self) -> bool {
        self.0.string.eq_ignore_ascii_case(&other.0.string)
    }
}

impl Default for Atom {
    fn default() -> Self {
        Atom::new("")
    }
}

impl PartialEq for Atom {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) ||
            (self.0.hash == other.0.hash && self.0.string == other.0.string)
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.0.hash)
    }
}

impl PrecomputedHash for Atom {
    #[inline]
    fn precomputed_hash(&self) -> u32 {
        self.0.hash
    }
}

impl Deref for Atom {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0.string
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0.string
    }
}

impl Borrow<str> for Atom {
    fn borrow(&self) -> &str {
        &self.0.string
    }
}

impl<'a> From<&'a str> for Atom {
    #[inline]
    fn from(string: &'a str) -> Self {
        Atom::new(string)
    }
}

impl From<String> for Atom {
    #[inline]
    fn from(string: String) -> Self {
        Atom::new(&string)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Atom({:?})", &*self.0.string)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.string)
    }
}

impl ToCss for Atom {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        serialize_identifier(&self.0.string, dest)
    }
}

macro_rules! atom_newtype {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Default, Eq, Hash, PartialEq)]
        pub struct $name(pub Atom);

        impl $name {
            /// Creates a new value from a string.
            pub fn new(string: &str) -> Self {
                $name(Atom::new(string))
            }

            /// Returns the ASCII-lowercase version of this value.
            pub fn to_ascii_lowercase(&self) -> Self {
                $name(self.0.to_ascii_lowercase())
            }
        }

        impl Deref for $name {
            type Target = Atom;

            #[inline]
            fn deref(&self) -> &Atom {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_ref()
            }
        }

        impl PrecomputedHash for $name {
            #[inline]
            fn precomputed_hash(&self) -> u32 {
                self.0.get_hash()
            }
        }

        impl<'a> From<&'a str> for $name {
            #[inline]
            fn from(string: &'a str) -> Self {
                $name(Atom::new(string))
            }
        }

        impl From<Atom> for $name {
            #[inline]
            fn from(atom: Atom) -> Self {
                $name(atom)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), &*self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

atom_newtype! {
    /// The local name of an element or attribute.
    LocalName
}

atom_newtype! {
    /// A namespace URL. The empty URL means "no namespace".
    Namespace
}

atom_newtype! {
    /// A namespace prefix, as declared by `@namespace`.
    Prefix
}

/// The HTML namespace.
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// The SVG namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
