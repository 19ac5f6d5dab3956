/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Style rules, and the per-selector entries the rule hash stores for them.

#![deny(missing_docs)]

use crate::error_reporting::{ContextualParseError, ParseErrorReporter};
use crate::selector_map::SelectorMapEntry;
use crate::selector_parser::{SelectorImpl, SelectorParser};
use cssparser::SourceLocation;
use selectors::parser::{ParseRelative, Selector, SelectorIter};
use selectors::{AncestorHashes, SelectorList};
use servo_arc::Arc;

/// A style rule: a selector list, the declarations it applies, and the rules
/// nested inside it.
#[derive(Debug)]
pub struct StyleRule {
    /// The selectors of the rule, possibly containing `&`.
    pub selectors: SelectorList<SelectorImpl>,
    /// The declaration block, kept as source text.
    pub declarations: Box<str>,
    /// Rules nested inside this one.
    pub rules: Vec<Arc<StyleRule>>,
    /// Where the rule starts in its style sheet.
    pub source_location: SourceLocation,
}

impl StyleRule {
    /// Creates a rule without nested rules.
    pub fn new(
        selectors: SelectorList<SelectorImpl>,
        declarations: &str,
        source_location: SourceLocation,
    ) -> Self {
        StyleRule {
            selectors,
            declarations: declarations.into(),
            rules: Vec::new(),
            source_location,
        }
    }

    /// Parses `selector_text` into a rule.
    ///
    /// Nested rules pass `ParseRelative::ForNesting`, so that they may start
    /// with a combinator. Invalid selectors are handed to `reporter` and the
    /// rule is dropped.
    pub fn parse(
        parser: &SelectorParser,
        selector_text: &str,
        declarations: &str,
        parse_relative: ParseRelative,
        source_location: SourceLocation,
        reporter: &dyn ParseErrorReporter,
    ) -> Option<Self> {
        match parser.parse(selector_text, parse_relative) {
            Ok(selectors) => Some(Self::new(selectors, declarations, source_location)),
            Err(error) => {
                reporter.report_error(
                    error.location,
                    ContextualParseError::InvalidRule(selector_text, error),
                );
                None
            },
        }
    }

    /// Adds a nested rule.
    pub fn push_nested(&mut self, rule: Arc<StyleRule>) {
        self.rules.push(rule);
    }
}

/// One entry of the rule hash: a single selector of a style rule, with any
/// `&` already resolved, and what is needed to sort and prefilter it.
#[derive(Clone, Debug)]
pub struct Rule {
    /// Matched against candidate elements.
    pub selector: Selector<SelectorImpl>,
    /// Checked against the ancestor bloom filter before `selector` is.
    pub hashes: AncestorHashes,
    /// Position among all selectors added to the stylist, breaking
    /// specificity ties.
    pub source_order: u32,
    /// Handed to the collector on a match.
    pub style_rule: Arc<StyleRule>,
}

impl Rule {
    /// Pairs `selector` with the rule it came from.
    pub fn new(
        selector: Selector<SelectorImpl>,
        hashes: AncestorHashes,
        style_rule: Arc<StyleRule>,
        source_order: u32,
    ) -> Self {
        Rule {
            selector,
            hashes,
            style_rule,
            source_order,
        }
    }

    /// The packed specificity of `selector`.
    pub fn specificity(&self) -> u32 {
        self.selector.specificity()
    }
}

impl SelectorMapEntry for Rule {
    fn selector(&self) -> SelectorIter<SelectorImpl> {
        self.selector.iter()
    }
}

/// Receives the style rules that matched an element, in cascade order.
pub trait StyleCollector {
    /// Called once per matching selector.
    fn collect(&mut self, rule: &Arc<StyleRule>);
}

impl StyleCollector for Vec<Arc<StyleRule>> {
    fn collect(&mut self, rule: &Arc<StyleRule>) {
        self.push(rule.clone());
    }
}
