/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Indexes rules by the most selective key of their subject compound, so an
//! element only ever tests the rules that could possibly apply to it.
//!
//! Each entry is stored once, under its subject compound's id if it has one,
//! else a class, else its lowercased type name, else in the catch-all list.
//! An element then gathers the buckets for its own id, classes and local
//! name plus the catch-all list. Any rule that can match the element is in
//! one of those, since its key is something the element must carry.

use crate::atoms::{Atom, LocalName};
use crate::dom::TElement;
use crate::recycler::Recycler;
use crate::rule::{Rule, StyleCollector};
use crate::selector_parser::SelectorImpl;
use log::trace;
use selectors::matching::matches_selector;
use selectors::parser::{Combinator, Component, SelectorIter};
use selectors::{MatchingContext, QuirksMode};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasherDefault, Hasher};

/// Passes through the `u32` an atom already carries instead of hashing again.
#[derive(Default)]
pub struct PrecomputedHasher(u64);

impl Hasher for PrecomputedHasher {
    fn write(&mut self, _: &[u8]) {
        unreachable!("keys of a PrecomputedHashMap hash themselves with write_u32")
    }

    #[inline]
    fn write_u32(&mut self, hash: u32) {
        self.0 = u64::from(hash);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

/// A map keyed by atoms, using their precomputed hashes.
pub type PrecomputedHashMap<K, V> = HashMap<K, V, BuildHasherDefault<PrecomputedHasher>>;

/// What a `SelectorMap` stores: anything that knows its selector.
pub trait SelectorMapEntry: Sized + Clone {
    /// The selector to index by, positioned at its subject compound.
    fn selector(&self) -> SelectorIter<SelectorImpl>;
}

type Bucket<T> = SmallVec<[T; 1]>;

/// Entries bucketed by the key of their subject compound.
pub struct SelectorMap<T: 'static> {
    ids: PrecomputedHashMap<Atom, Bucket<T>>,
    classes: PrecomputedHashMap<Atom, Bucket<T>>,
    /// Keyed by the lowercased name.
    local_names: PrecomputedHashMap<LocalName, Bucket<T>>,
    /// Entries whose subject compound offers no usable key.
    rest: Bucket<T>,
    count: usize,
    /// Scratch space for `get_all_matching_rules`.
    matched: Recycler<Vec<T>>,
}

impl<T: fmt::Debug + 'static> fmt::Debug for SelectorMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SelectorMap")
            .field("ids", &self.ids)
            .field("classes", &self.classes)
            .field("local_names", &self.local_names)
            .field("rest", &self.rest)
            .finish()
    }
}

impl<T: 'static> Default for SelectorMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> SelectorMap<T> {
    /// An empty map.
    pub fn new() -> Self {
        SelectorMap {
            ids: HashMap::default(),
            classes: HashMap::default(),
            local_names: HashMap::default(),
            rest: SmallVec::new(),
            count: 0,
            matched: Recycler::new(Vec::new, Vec::clear),
        }
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.classes.clear();
        self.local_names.clear();
        self.rest.clear();
        self.count = 0;
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The number of entries inserted since the last `clear`.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Every entry, each exactly once, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.ids
            .values()
            .chain(self.classes.values())
            .chain(self.local_names.values())
            .chain(std::iter::once(&self.rest))
            .flatten()
    }

    /// The buckets `element` has to look in: its id's, each distinct class's,
    /// its local name's, and the catch-all one, in that order.
    fn buckets_for<E: TElement>(&self, element: E, quirks_mode: QuirksMode) -> SmallVec<[&[T]; 8]> {
        let target = element.rule_hash_target();
        let mut buckets = SmallVec::<[&[T]; 8]>::new();

        if let Some(id) = target.id() {
            buckets.extend(self.ids.get(&fold_case(id, quirks_mode)).map(|b| &b[..]));
        }

        // `class="a a"` names the same bucket twice, and so does
        // `class="A a"` in quirks mode.
        let mut class_keys = SmallVec::<[Atom; 4]>::new();
        target.each_class(|class| {
            let key = fold_case(class, quirks_mode);
            if !class_keys.contains(&key) {
                class_keys.push(key);
            }
        });
        for key in &class_keys {
            buckets.extend(self.classes.get(key).map(|b| &b[..]));
        }

        let local_name = target.local_name().to_ascii_lowercase();
        buckets.extend(self.local_names.get(&local_name).map(|b| &b[..]));
        buckets.push(&self.rest[..]);
        buckets
    }
}

/// The key ids and classes are stored and looked up under.
fn fold_case(atom: &Atom, quirks_mode: QuirksMode) -> Atom {
    match quirks_mode {
        QuirksMode::Quirks => atom.to_ascii_lowercase(),
        QuirksMode::LimitedQuirks | QuirksMode::NoQuirks => atom.clone(),
    }
}

impl SelectorMap<Rule> {
    /// Hands every rule matching `element` to `collector`, in ascending
    /// cascade order: by specificity, then by source order.
    pub fn get_all_matching_rules<E, C>(
        &self,
        element: E,
        context: &mut MatchingContext<SelectorImpl>,
        collector: &mut C,
    ) where
        E: TElement,
        C: StyleCollector,
    {
        if self.is_empty() {
            return;
        }

        let mut matched = self.matched.acquire();
        let candidates = self.buckets_for(element, context.quirks_mode());
        matched.extend(
            candidates
                .into_iter()
                .flatten()
                .filter(|rule| {
                    matches_selector(&rule.selector, 0, Some(&rule.hashes), &element, context)
                })
                .cloned(),
        );
        matched.sort_unstable_by_key(|rule| (rule.specificity(), rule.source_order));
        trace!("{:?}: {} of {} rules matched", element, matched.len(), self.len());

        for rule in &matched {
            collector.collect(&rule.style_rule);
        }
        self.matched.release(matched);
    }
}

impl<T: SelectorMapEntry> SelectorMap<T> {
    /// Stores `entry` in the one bucket its subject compound selects.
    pub fn insert(&mut self, entry: T, quirks_mode: QuirksMode) {
        let bucket = match find_key(entry.selector()) {
            Key::Id(id) => self.ids.entry(fold_case(id, quirks_mode)).or_default(),
            Key::Class(class) => self.classes.entry(fold_case(class, quirks_mode)).or_default(),
            Key::LocalName(lower_name) => self.local_names.entry(lower_name.clone()).or_default(),
            Key::None => &mut self.rest,
        };
        bucket.push(entry);
        self.count += 1;
    }

    /// Feeds `f` every entry that might match `element`: id bucket first,
    /// then class buckets, then the local name's, then the catch-all one.
    /// Stops as soon as `f` returns false, and returns whether it never did.
    pub fn lookup<'a, E, F>(&'a self, element: E, quirks_mode: QuirksMode, f: F) -> bool
    where
        E: TElement,
        F: FnMut(&'a T) -> bool,
    {
        self.buckets_for(element, quirks_mode)
            .into_iter()
            .flatten()
            .all(f)
    }
}

/// The most selective thing an element must have for a compound to match.
#[derive(Clone, Copy)]
enum Key<'a> {
    None,
    /// Always the lowercased name. HTML elements match a type selector
    /// case-insensitively, others case-sensitively, and both land here when
    /// looked up by their lowercased local name.
    LocalName(&'a LocalName),
    Class(&'a Atom),
    Id(&'a Atom),
}

impl<'a> Key<'a> {
    fn rank(&self) -> u8 {
        match *self {
            Key::None => 0,
            Key::LocalName(..) => 1,
            Key::Class(..) => 2,
            Key::Id(..) => 3,
        }
    }
}

fn key_of(component: &Component<SelectorImpl>) -> Key {
    match *component {
        Component::ID(ref id) => Key::Id(id),
        Component::Class(ref class) => Key::Class(class),
        Component::LocalName(ref name) => Key::LocalName(&name.lower_name),
        // With one alternative, whatever it requires is required here too.
        // Several alternatives share no key, and `:not()` keys are things the
        // element lacks.
        Component::Is(ref list) | Component::Where(ref list) => match *list.slice() {
            [ref only] => find_key(only.iter()),
            _ => Key::None,
        },
        _ => Key::None,
    }
}

/// Picks the best key of the subject compound. For a pseudo-element
/// selector, the originating element's compound counts too.
fn find_key(mut compound: SelectorIter<SelectorImpl>) -> Key {
    let mut best = Key::None;
    loop {
        for component in &mut compound {
            let key = key_of(component);
            if key.rank() > best.rank() {
                best = key;
            }
        }
        if compound.next_sequence() != Some(Combinator::PseudoElement) {
            return best;
        }
    }
}
