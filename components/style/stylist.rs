/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The document-wide rule index that `push_applicable_declarations` answers
//! from.

#![deny(missing_docs)]

use crate::dom::TElement;
use crate::rule::{Rule, StyleCollector, StyleRule};
use crate::selector_map::SelectorMap;
use crate::selector_parser::{PseudoElement, SelectorImpl};
use log::debug;
use rustc_hash::FxHashMap;
use selectors::{AncestorHashes, MatchingContext, QuirksMode, SelectorList};
use servo_arc::Arc;

/// Every selector of a document's style rules, flattened (nested rules
/// resolved against their parents) and indexed by the pseudo-element it
/// styles, if any.
#[derive(Debug)]
pub struct Stylist {
    /// Decides how ids and classes are keyed.
    quirks_mode: QuirksMode,
    element_map: SelectorMap<Rule>,
    pseudos_map: FxHashMap<PseudoElement, SelectorMap<Rule>>,
    /// Bumped once per style rule. Every selector of a rule shares its value.
    next_source_order: u32,
    selector_count: usize,
    rebuild_count: usize,
}

impl Stylist {
    /// A stylist with no rules, for a document in `quirks_mode`.
    pub fn new(quirks_mode: QuirksMode) -> Self {
        Stylist {
            quirks_mode,
            element_map: SelectorMap::new(),
            pseudos_map: FxHashMap::default(),
            next_source_order: 0,
            selector_count: 0,
            rebuild_count: 0,
        }
    }

    /// The quirks mode rules are indexed for.
    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    /// How many selectors are indexed, counting each `&`-resolved selector
    /// of a nested rule.
    pub fn num_selectors(&self) -> usize {
        self.selector_count
    }

    /// How many times `rebuild` ran.
    pub fn num_rebuilds(&self) -> usize {
        self.rebuild_count
    }

    /// Drops every rule.
    pub fn clear(&mut self) {
        self.element_map.clear();
        self.pseudos_map.clear();
        self.next_source_order = 0;
        self.selector_count = 0;
    }

    /// Re-indexes `rules` from scratch, in the given quirks mode.
    pub fn rebuild(&mut self, quirks_mode: QuirksMode, rules: &[Arc<StyleRule>]) {
        self.clear();
        self.quirks_mode = quirks_mode;
        self.rebuild_count += 1;
        rules.iter().for_each(|rule| self.insert_style_rule(rule));
        debug!(
            "Rebuilt stylist: {} rules, {} selectors",
            self.next_source_order, self.selector_count
        );
    }

    /// Indexes a top-level style rule, and the rules nested in it.
    pub fn insert_style_rule(&mut self, rule: &Arc<StyleRule>) {
        self.insert_rule_with_parent(rule, None);
    }

    fn insert_rule_with_parent(
        &mut self,
        rule: &Arc<StyleRule>,
        parent: Option<&SelectorList<SelectorImpl>>,
    ) {
        // Nested rules are matched as if each `&` were the parent's selectors.
        let selectors = match parent {
            Some(parent) if rule
                .selectors
                .slice()
                .iter()
                .any(|s| s.has_parent_selector()) =>
            {
                rule.selectors.replace_parent_selector(parent)
            },
            _ => rule.selectors.clone(),
        };

        let source_order = self.next_source_order;
        self.next_source_order += 1;
        for selector in selectors.slice() {
            let hashes = AncestorHashes::new(selector, self.quirks_mode);
            let entry = Rule::new(selector.clone(), hashes, rule.clone(), source_order);
            let map = match selector.pseudo_element() {
                Some(pseudo) => self.pseudos_map.entry(*pseudo).or_default(),
                None => &mut self.element_map,
            };
            map.insert(entry, self.quirks_mode);
            self.selector_count += 1;
        }

        for nested in &rule.rules {
            self.insert_rule_with_parent(nested, Some(&selectors));
        }
    }

    /// Hands the style rules that apply to `element`, or to its
    /// `pseudo_element`, to `collector`, in ascending cascade order.
    ///
    /// For pseudo-elements `element` is the pseudo-element itself, whose
    /// originating element is used for the rule hash lookup.
    pub fn push_applicable_declarations<E, C>(
        &self,
        element: E,
        pseudo_element: Option<&PseudoElement>,
        context: &mut MatchingContext<SelectorImpl>,
        collector: &mut C,
    ) where
        E: TElement,
        C: StyleCollector,
    {
        let map = match pseudo_element {
            Some(pseudo) => self.pseudos_map.get(pseudo),
            None => Some(&self.element_map),
        };
        let Some(map) = map else {
            return;
        };

        debug!(
            "Collecting rules for {:?} (pseudo: {:?})",
            element, pseudo_element
        );
        map.get_all_matching_rules(element, context, collector);
    }
}
