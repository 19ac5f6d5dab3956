/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Types and traits used to access the DOM from style calculation.

#![deny(missing_docs)]

use crate::atoms::{Atom, LocalName, Namespace};
use crate::selector_parser::{NonTSPseudoClass, SelectorImpl};
use bitflags::bitflags;
use selectors::{Element as SelectorsElement, MatchingContext, VisitedHandlingMode};
use std::fmt::Debug;
use std::hash::Hash;

bitflags! {
    /// Event-based element states.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ElementState: u32 {
        /// <https://html.spec.whatwg.org/multipage/#selector-active>
        const ACTIVE = 1 << 0;
        /// <https://html.spec.whatwg.org/multipage/#selector-focus>
        const FOCUS = 1 << 1;
        /// <https://html.spec.whatwg.org/multipage/#selector-hover>
        const HOVER = 1 << 2;
        /// <https://html.spec.whatwg.org/multipage/#selector-enabled>
        const ENABLED = 1 << 3;
        /// <https://html.spec.whatwg.org/multipage/#selector-disabled>
        const DISABLED = 1 << 4;
        /// <https://html.spec.whatwg.org/multipage/#selector-checked>
        const CHECKED = 1 << 5;
        /// <https://html.spec.whatwg.org/multipage/#selector-indeterminate>
        const INDETERMINATE = 1 << 6;
        /// <https://html.spec.whatwg.org/multipage/#selector-placeholder-shown>
        const PLACEHOLDER_SHOWN = 1 << 7;
        /// <https://html.spec.whatwg.org/multipage/#selector-target>
        const TARGET = 1 << 8;
        /// <https://drafts.csswg.org/selectors-4/#the-focus-within-pseudo>
        const FOCUS_WITHIN = 1 << 9;
        /// <https://html.spec.whatwg.org/multipage/#selector-read-write>
        const READ_WRITE = 1 << 10;
        /// Set on links whose target has been visited.
        const VISITED = 1 << 11;
    }
}

/// The element trait, the main abstraction the style crate acts over.
pub trait TElement:
    Eq + PartialEq + Debug + Hash + Sized + Copy + Clone + SelectorsElement<Impl = SelectorImpl>
{
    /// Get this element's local name.
    fn local_name(&self) -> &LocalName;

    /// Get this element's namespace.
    fn namespace(&self) -> &Namespace;

    /// Get this element's id, if any.
    fn id(&self) -> Option<&Atom>;

    /// Internal iterator for the classes of this element.
    fn each_class<F>(&self, callback: F)
    where
        F: FnMut(&Atom);

    /// Get this element's state, for non-tree-structural pseudos.
    fn state(&self) -> ElementState;

    /// Whether this element's language matches the `:lang()` argument.
    fn match_element_lang(&self, value: &str) -> bool;

    /// Get this element's parent for the purposes of style traversal.
    fn traversal_parent(&self) -> Option<Self> {
        self.parent_element()
    }

    /// The element whose id, classes and local name are used to look up
    /// rules. That's the originating element for pseudo-elements.
    fn rule_hash_target(&self) -> Self {
        self.pseudo_element_originating_element().unwrap_or(*self)
    }
}

/// Matches a non-tree-structural pseudo-class against `element`.
///
/// Elements implementing `selectors::Element::match_non_ts_pseudo_class` are
/// expected to forward here.
pub fn match_non_ts_pseudo_class<E>(
    element: &E,
    pseudo_class: &NonTSPseudoClass,
    context: &mut MatchingContext<SelectorImpl>,
) -> bool
where
    E: TElement,
{
    match *pseudo_class {
        NonTSPseudoClass::AnyLink => element.is_link(),
        NonTSPseudoClass::Link => {
            element.is_link() &&
                match context.visited_handling() {
                    VisitedHandlingMode::RelevantLinkVisited => {
                        !element.state().contains(ElementState::VISITED)
                    },
                    handling => handling.matches_unvisited(),
                }
        },
        NonTSPseudoClass::Visited => {
            element.is_link() &&
                match context.visited_handling() {
                    VisitedHandlingMode::RelevantLinkVisited => {
                        element.state().contains(ElementState::VISITED)
                    },
                    handling => handling.matches_visited(),
                }
        },
        NonTSPseudoClass::Lang(ref lang) => element.match_element_lang(lang),
        NonTSPseudoClass::ReadOnly => !element.state().contains(ElementState::READ_WRITE),
        ref other => element.state().intersects(other.state_flag()),
    }
}
