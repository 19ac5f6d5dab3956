/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The ancestor filter a traversal keeps while styling a tree.

#![deny(missing_docs)]

use crate::dom::TElement;
use log::debug;
use precomputed_hash::PrecomputedHash;
use selectors::bloom::BloomFilter;
use smallvec::SmallVec;

/// Above this many hashes, zeroing the whole filter beats removing them one
/// at a time.
const BULK_CLEAR_THRESHOLD: usize = 25;

/// One ancestor and the hashes it put in the filter.
struct Frame<E> {
    element: E,
    hashes: SmallVec<[u32; 4]>,
}

/// A counting bloom filter over the names (local name, namespace, id and
/// classes) of the ancestors of the element being styled, with the stack of
/// those ancestors.
///
/// A top-down traversal pushes an element before styling its children and
/// pops it afterwards. When the traversal jumps elsewhere,
/// `insert_parents_recovering` reuses whatever prefix of the stack is still
/// an ancestor chain of the new element.
pub struct StyleBloom<E: TElement> {
    filter: Box<BloomFilter>,
    stack: SmallVec<[Frame<E>; 16]>,
}

impl<E: TElement> Default for StyleBloom<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TElement> StyleBloom<E> {
    /// An empty filter.
    pub fn new() -> Self {
        StyleBloom {
            filter: Box::new(BloomFilter::new()),
            stack: SmallVec::new(),
        }
    }

    /// The filter, for `MatchingContext::bloom_filter`.
    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }

    fn hashes_of(element: E) -> SmallVec<[u32; 4]> {
        let mut hashes = SmallVec::new();
        hashes.push(element.local_name().precomputed_hash());
        hashes.push(element.namespace().precomputed_hash());
        if let Some(id) = element.id() {
            hashes.push(id.get_hash());
        }
        element.each_class(|class| hashes.push(class.get_hash()));
        hashes
    }

    /// Pushes `element`, which must be a child of `current_parent()`, or a
    /// root when the filter is empty.
    pub fn push(&mut self, element: E) {
        debug_assert_eq!(
            element.traversal_parent(),
            self.current_parent(),
            "pushed element is not a child of the top of the stack"
        );
        let hashes = Self::hashes_of(element);
        for &hash in &hashes {
            self.filter.insert_hash(hash);
        }
        self.stack.push(Frame { element, hashes });
    }

    /// Pops the innermost ancestor, removing its hashes.
    pub fn pop(&mut self) -> Option<E> {
        let frame = self.stack.pop()?;
        debug_assert_eq!(frame.hashes, Self::hashes_of(frame.element));
        for &hash in &frame.hashes {
            self.filter.remove_hash(hash);
        }
        Some(frame.element)
    }

    /// Whether no ancestor is recorded.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// How many ancestors are recorded, which is the depth of the elements
    /// the filter is valid for.
    pub fn matching_depth(&self) -> usize {
        self.stack.len()
    }

    /// The innermost recorded ancestor.
    pub fn current_parent(&self) -> Option<E> {
        self.stack.last().map(|frame| frame.element)
    }

    /// Forgets every ancestor.
    pub fn clear(&mut self) {
        let total: usize = self.stack.iter().map(|frame| frame.hashes.len()).sum();
        if total > BULK_CLEAR_THRESHOLD {
            self.stack.clear();
            self.filter.clear();
            return;
        }
        for frame in self.stack.drain(..) {
            for hash in frame.hashes {
                self.filter.remove_hash(hash);
            }
        }
        debug_assert!(self.filter.is_zeroed());
    }

    /// Clears the filter and fills it with every ancestor of `element`.
    pub fn rebuild(&mut self, element: E) {
        self.clear();
        let mut ancestors = SmallVec::<[E; 16]>::new();
        let mut next = element.traversal_parent();
        while let Some(ancestor) = next {
            ancestors.push(ancestor);
            next = ancestor.traversal_parent();
        }
        for ancestor in ancestors.into_iter().rev() {
            self.push(ancestor);
        }
    }

    /// Makes the filter hold exactly the ancestors of `element`, which sits
    /// `depth` levels below the root. Shares as much as it can with what is
    /// already recorded. A wrong `depth` is detected and answered with a
    /// rebuild.
    pub fn insert_parents_recovering(&mut self, element: E, depth: usize) {
        if self.is_empty() {
            return self.rebuild(element);
        }
        let Some(parent) = element.traversal_parent() else {
            return self.clear();
        };
        if self.current_parent() == Some(parent) {
            return;
        }
        if depth == 0 {
            debug!("Element with a parent claims depth 0, rebuilding");
            return self.rebuild(element);
        }

        // Nothing deeper than the parent can be an ancestor.
        while self.stack.len() > depth {
            self.pop();
        }

        // Climb from the parent until level with the top of the stack.
        let mut missing = SmallVec::<[E; 16]>::new();
        let mut candidate = parent;
        let mut candidate_depth = depth - 1;
        while candidate_depth >= self.stack.len() {
            missing.push(candidate);
            let Some(up) = candidate.traversal_parent() else {
                debug!("Bad element depth {}, rebuilding", depth);
                return self.rebuild(element);
            };
            candidate = up;
            candidate_depth -= 1;
        }

        // Then climb both together until they meet.
        while self.current_parent() != Some(candidate) {
            self.pop();
            missing.push(candidate);
            match candidate.traversal_parent() {
                Some(up) => candidate = up,
                None => break,
            }
        }

        for ancestor in missing.into_iter().rev() {
            self.push(ancestor);
        }
        if self.stack.len() != depth {
            debug!("Bad element depth {}, rebuilding", depth);
            self.rebuild(element);
        }
    }
}
