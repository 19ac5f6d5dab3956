/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Selector syntax: the parsed representation the matcher consumes, and the
//! recursive-descent parser that produces it from a `cssparser` token stream.

use crate::attr::{AttrSelectorOperator, AttrSelectorWithOptionalNamespace};
use crate::attr::{NamespaceConstraint, ParsedAttrSelectorOperation, ParsedCaseSensitivity};
use crate::bloom::BLOOM_HASH_MASK;
use crate::builder::{specificity_and_flags, SelectorBuilder, SelectorFlags};
use crate::builder::{Specificity, SpecificityAndFlags};
use crate::context::QuirksMode;
use bitflags::bitflags;
use cssparser::{match_ignore_ascii_case, parse_nth};
use cssparser::{BasicParseError, BasicParseErrorKind, ParseError, ParseErrorKind};
use cssparser::{CowRcStr, Delimiter, SourceLocation, Token};
use cssparser::Parser as CssParser;
use log::trace;
use precomputed_hash::PrecomputedHash;
use servo_arc::Arc;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::iter::Rev;
use std::slice;

/// How deep selector arguments (`:is()`, `:not()`, `:has()`, `of S`...) may
/// nest. One level more fails with `NestingTooDeep`.
pub const MAX_NESTING_DEPTH: usize = 64;

pub trait PseudoElement: Sized + Clone + Debug + Eq {
    type Impl: SelectorImpl;

    /// Whether user-action pseudo-classes may follow it, as in `::before:hover`.
    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    /// Whether it may follow `::slotted()`.
    fn valid_after_slotted(&self) -> bool {
        false
    }
}

pub trait NonTSPseudoClass: Sized + Clone + Debug + Eq {
    type Impl: SelectorImpl;

    /// `:hover`, `:active`, `:focus` and the other user-action states. Only
    /// these may follow a pseudo-element.
    fn is_user_action_state(&self) -> bool;
}

/// The embedder's string and pseudo types.
pub trait SelectorImpl: Clone + Debug + Eq + Sized + 'static {
    type AttrValue: Clone + Debug + Eq + Hash + for<'a> From<&'a str> + AsRef<str>;
    /// Ids and class names.
    type Identifier: Clone + Debug + Eq + Hash + for<'a> From<&'a str> + PrecomputedHash;
    type LocalName: Clone + Debug + Eq + Hash + for<'a> From<&'a str> + PrecomputedHash;
    type NamespaceUrl: Clone + Debug + Eq + Hash + AsRef<str> + Default + PrecomputedHash;
    type NamespacePrefix: Clone + Debug + Eq + Hash + for<'a> From<&'a str> + Default;
    type NonTSPseudoClass: Clone + Debug + Eq + Hash + NonTSPseudoClass<Impl = Self>;
    type PseudoElement: Clone + Debug + Eq + Hash + PseudoElement<Impl = Self>;
}

/// Hooks the embedder provides while parsing: namespace lookup, pseudo
/// names, and switches for the optional syntax.
pub trait Parser<'i> {
    type Impl: SelectorImpl;

    fn parse_slotted(&self) -> bool {
        false
    }

    fn parse_part(&self) -> bool {
        false
    }

    fn parse_is_and_where(&self) -> bool {
        false
    }

    fn parse_has(&self) -> bool {
        false
    }

    /// Whether `&` is the nesting selector.
    fn parse_parent_selector(&self) -> bool {
        false
    }

    /// Whether `:name` (one colon) names a pseudo-element.
    fn pseudo_element_allows_single_colon(&self, name: &str) -> bool {
        is_css2_pseudo_element(name)
    }

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<<Self::Impl as SelectorImpl>::NonTSPseudoClass, SelectorParseError<'i>> {
        Err(location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn parse_non_ts_functional_pseudo_class<'t>(
        &self,
        name: CowRcStr<'i>,
        arguments: &mut CssParser<'i, 't>,
    ) -> Result<<Self::Impl as SelectorImpl>::NonTSPseudoClass, SelectorParseError<'i>> {
        Err(arguments.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn parse_pseudo_element(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<<Self::Impl as SelectorImpl>::PseudoElement, SelectorParseError<'i>> {
        Err(location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn default_namespace(&self) -> Option<<Self::Impl as SelectorImpl>::NamespaceUrl> {
        None
    }

    fn namespace_for_prefix(
        &self,
        _prefix: &<Self::Impl as SelectorImpl>::NamespacePrefix,
    ) -> Option<<Self::Impl as SelectorImpl>::NamespaceUrl> {
        None
    }

    fn namespace_prefix(&self, prefix: &str) -> <Self::Impl as SelectorImpl>::NamespacePrefix {
        prefix.into()
    }
}

/// `:before`, `:after`, `:first-line` and `:first-letter`, which predate
/// the double colon. The set is closed.
pub fn is_css2_pseudo_element(name: &str) -> bool {
    match_ignore_ascii_case! { name,
        "before" | "after" | "first-line" | "first-letter" => true,
        _ => false,
    }
}

/// What a leading combinator (or its absence) is relative to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseRelative {
    /// Nested style rules: a leading combinator, or no `&` at all, implies
    /// `&` on the left.
    ForNesting,
    /// A leading combinator is an error.
    No,
    /// `:has()` arguments: everything is relative to the anchor element,
    /// through a descendant combinator unless another one is written.
    ForHas,
}

pub type SelectorParseError<'i> = ParseError<'i, SelectorParseErrorKind<'i>>;

#[derive(Clone, Debug, PartialEq)]
pub enum SelectorParseErrorKind<'i> {
    NoQualifiedNameInAttributeSelector(Token<'i>),
    EmptySelector,
    DanglingCombinator,
    InvalidState,
    UnexpectedTokenInAttributeSelector(Token<'i>),
    PseudoElementExpectedColon(Token<'i>),
    PseudoElementExpectedIdent(Token<'i>),
    NoIdentForPseudo(Token<'i>),
    UnsupportedPseudoClassOrElement(CowRcStr<'i>),
    UnexpectedIdent(CowRcStr<'i>),
    ExpectedNamespace(CowRcStr<'i>),
    ExpectedBarInAttr(Token<'i>),
    BadValueInAttr(Token<'i>),
    InvalidQualNameInAttr(Token<'i>),
    ExplicitNamespaceUnexpectedToken(Token<'i>),
    ClassNeedsIdent(Token<'i>),
    NonPseudoElementAfterSlotted,
    InvalidPseudoElementAfterSlotted,
    InvalidPseudoElementInsideWhere,
    NestingTooDeep,
}

/// Comma-separated complex selectors: a style rule's prelude, or the
/// argument of `:is()`, `:where()` or `:not()`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectorList<Impl: SelectorImpl>(SmallVec<[Selector<Impl>; 1]>);

impl<Impl: SelectorImpl> SelectorList<Impl> {
    pub fn from_iter(iter: impl Iterator<Item = Selector<Impl>>) -> Self {
        SelectorList(iter.collect())
    }

    pub fn from_vec(selectors: Vec<Selector<Impl>>) -> Self {
        SelectorList(SmallVec::from_vec(selectors))
    }

    #[inline]
    pub fn slice(&self) -> &[Selector<Impl>] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a whole selector list. Any invalid selector fails the list.
    pub fn parse<'i, 't, P>(
        parser: &P,
        input: &mut CssParser<'i, 't>,
        parse_relative: ParseRelative,
    ) -> Result<Self, SelectorParseError<'i>>
    where
        P: Parser<'i, Impl = Impl>,
    {
        parse_list(
            parser,
            input,
            ParseState::empty(),
            Recovery::Strict,
            parse_relative,
            0,
        )
    }

    pub fn replace_parent_selector(&self, parent: &SelectorList<Impl>) -> Self {
        Self::from_iter(self.0.iter().map(|selector| selector.replace_parent_selector(parent)))
    }
}

struct SelectorData<Impl: SelectorImpl> {
    specificity_and_flags: SpecificityAndFlags,
    components: Box<[Component<Impl>]>,
}

/// One complex selector, shared behind an `Arc`.
///
/// Components sit in matching order: the subject compound comes first and
/// each combinator precedes the compound to its left. Within a compound the
/// cheap checks (type, id, class) come first.
#[derive(Clone)]
pub struct Selector<Impl: SelectorImpl>(Arc<SelectorData<Impl>>);

impl<Impl: SelectorImpl> PartialEq for Selector<Impl> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) ||
            (self.0.specificity_and_flags == other.0.specificity_and_flags &&
                self.0.components == other.0.components)
    }
}

impl<Impl: SelectorImpl> Eq for Selector<Impl> {}

impl<Impl: SelectorImpl> Debug for Selector<Impl> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Selector")
            .field("specificity", &Specificity::from(self.specificity()))
            .field("flags", &self.flags())
            .field("components", &&*self.0.components)
            .finish()
    }
}

impl<Impl: SelectorImpl> Selector<Impl> {
    pub(crate) fn from_parts(
        specificity_and_flags: SpecificityAndFlags,
        components: Box<[Component<Impl>]>,
    ) -> Self {
        Selector(Arc::new(SelectorData {
            specificity_and_flags,
            components,
        }))
    }

    /// Parses one complex selector, with no leading combinator.
    pub fn parse<'i, 't, P>(
        parser: &P,
        input: &mut CssParser<'i, 't>,
    ) -> Result<Self, SelectorParseError<'i>>
    where
        P: Parser<'i, Impl = Impl>,
    {
        parse_selector(parser, input, ParseState::empty(), ParseRelative::No, 0)
    }

    /// The packed specificity, `id << 20 | class << 10 | element`.
    #[inline]
    pub fn specificity(&self) -> u32 {
        self.0.specificity_and_flags.specificity()
    }

    #[inline]
    pub fn flags(&self) -> SelectorFlags {
        self.0.specificity_and_flags.flags()
    }

    #[inline]
    pub(crate) fn specificity_and_flags(&self) -> SpecificityAndFlags {
        self.0.specificity_and_flags
    }

    #[inline]
    pub fn has_pseudo_element(&self) -> bool {
        self.0.specificity_and_flags.has_pseudo_element()
    }

    #[inline]
    pub fn has_parent_selector(&self) -> bool {
        self.0.specificity_and_flags.has_parent_selector()
    }

    #[inline]
    pub fn is_slotted(&self) -> bool {
        self.0.specificity_and_flags.is_slotted()
    }

    #[inline]
    pub fn is_part(&self) -> bool {
        self.0.specificity_and_flags.is_part()
    }

    /// The pseudo-element this selector styles, if any. It always sits in
    /// the subject compound.
    pub fn pseudo_element(&self) -> Option<&Impl::PseudoElement> {
        if !self.has_pseudo_element() {
            return None;
        }
        let found = self.iter().find_map(|component| match *component {
            Component::PseudoElement(ref pseudo) => Some(pseudo),
            _ => None,
        });
        debug_assert!(found.is_some(), "HAS_PSEUDO set without a pseudo-element");
        found
    }

    /// Walks the subject compound; see `SelectorIter`.
    #[inline]
    pub fn iter(&self) -> SelectorIter<Impl> {
        self.iter_from(0)
    }

    /// Like `iter`, after skipping the first `offset` components in
    /// matching order.
    #[inline]
    pub fn iter_from(&self, offset: usize) -> SelectorIter<Impl> {
        SelectorIter {
            iter: self.0.components[offset..].iter(),
            next_combinator: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.components.len()
    }

    #[inline]
    pub fn iter_raw_match_order(&self) -> slice::Iter<Component<Impl>> {
        self.0.components.iter()
    }

    /// Components from left to right, starting `offset` components in.
    #[inline]
    pub fn iter_raw_parse_order_from(&self, offset: usize) -> Rev<slice::Iter<Component<Impl>>> {
        self.0.components[..self.len() - offset].iter().rev()
    }

    /// The combinator `index` components from the right. Panics if that
    /// component is not a combinator.
    pub fn combinator_at_match_order(&self, index: usize) -> Combinator {
        self.combinator_at(index)
    }

    /// The combinator `index` components from the left. Panics if that
    /// component is not a combinator.
    pub fn combinator_at_parse_order(&self, index: usize) -> Combinator {
        self.combinator_at(self.len() - index - 1)
    }

    fn combinator_at(&self, position: usize) -> Combinator {
        match self.0.components[position] {
            Component::Combinator(combinator) => combinator,
            ref other => panic!("{:?} at {} in {:?} is not a combinator", other, position, self),
        }
    }

    /// Builds a selector from components in parse order with a given
    /// specificity, bypassing the parser.
    #[cfg(test)]
    pub(crate) fn from_vec(
        components: Vec<Component<Impl>>,
        specificity: u32,
        flags: SelectorFlags,
    ) -> Self {
        let mut builder = SelectorBuilder::default();
        for component in components {
            match component.as_combinator() {
                Some(combinator) => builder.push_combinator(combinator),
                None => builder.push_simple_selector(component),
            }
        }
        builder.build_with_specificity_and_flags(
            SpecificityAndFlags { specificity, flags },
            ParseRelative::No,
        )
    }

    /// Substitutes `:is(<parent>)` for every `&`, however deeply nested.
    ///
    /// Specificity and flags are recomputed over the rebuilt components, so
    /// `&` weighs exactly what `:is(<parent>)` would have weighed had it been
    /// written in its place.
    pub fn replace_parent_selector(&self, parent: &SelectorList<Impl>) -> Self {
        if !self.has_parent_selector() {
            return self.clone();
        }
        let components: Box<[_]> = self
            .iter_raw_match_order()
            .map(|component| component.replace_parent_selector(parent))
            .collect();
        let computed = specificity_and_flags(components.iter());
        debug_assert!(!computed.has_parent_selector());
        Selector::from_parts(computed, components)
    }
}

/// Walks one compound at a time in matching order. `next` yields `None` at
/// the end of each compound; `next_sequence` then hands over the combinator
/// to the left and lets `next` continue with the following compound.
#[derive(Clone)]
pub struct SelectorIter<'a, Impl: 'a + SelectorImpl> {
    iter: slice::Iter<'a, Component<Impl>>,
    next_combinator: Option<Combinator>,
}

impl<'a, Impl: 'a + SelectorImpl> SelectorIter<'a, Impl> {
    #[inline]
    pub fn next_sequence(&mut self) -> Option<Combinator> {
        self.next_combinator.take()
    }
}

impl<'a, Impl: SelectorImpl> Iterator for SelectorIter<'a, Impl> {
    type Item = &'a Component<Impl>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        debug_assert!(
            self.next_combinator.is_none(),
            "next_sequence() must be called between compounds"
        );
        let component = self.iter.next()?;
        match component.as_combinator() {
            Some(combinator) => {
                self.next_combinator = Some(combinator);
                None
            },
            None => Some(component),
        }
    }
}

impl<'a, Impl: SelectorImpl> Debug for SelectorIter<'a, Impl> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter.clone().rev()).finish()
    }
}

/// Hashes of up to four names some ancestor must carry for the selector to
/// match, checked against the bloom filter before any real matching.
///
/// The filter only reads the low 24 bits of a hash, so the fourth hash is
/// split over the top bytes of the other three. A zero slot ends the list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AncestorHashes {
    pub packed_hashes: [u32; 3],
}

impl AncestorHashes {
    pub fn new<Impl: SelectorImpl>(selector: &Selector<Impl>, quirks_mode: QuirksMode) -> Self {
        let mut sink = HashSink {
            hashes: [0; 4],
            len: 0,
            quirks_mode,
        };

        // The subject compound describes the element itself, and compounds
        // behind sibling or pseudo-element combinators aren't ancestors. A
        // child or descendant combinator gets back onto the ancestor chain.
        let mut iter = selector.iter();
        let mut on_ancestor_chain = false;
        loop {
            if on_ancestor_chain {
                if !sink.add_compound(&mut iter) {
                    break;
                }
            } else {
                iter.by_ref().for_each(drop);
            }
            match iter.next_sequence() {
                Some(combinator) => {
                    on_ancestor_chain =
                        matches!(combinator, Combinator::Child | Combinator::Descendant)
                },
                None => break,
            }
        }

        let [first, second, third, fourth] = sink.hashes;
        let mut packed_hashes = [first, second, third];
        for (i, slot) in packed_hashes.iter_mut().enumerate() {
            *slot |= ((fourth >> (8 * i)) & 0xff) << 24;
        }
        AncestorHashes { packed_hashes }
    }

    /// Reassembles the fourth hash from the top bytes of the other three.
    pub fn fourth_hash(&self) -> u32 {
        self.packed_hashes
            .iter()
            .enumerate()
            .fold(0, |hash, (i, packed)| hash | (packed >> 24) << (8 * i))
    }
}

struct HashSink {
    hashes: [u32; 4],
    len: usize,
    quirks_mode: QuirksMode,
}

impl HashSink {
    /// Records what one ancestor compound requires. Returns false once every
    /// slot is taken.
    fn add_compound<'a, Impl: 'a + SelectorImpl>(
        &mut self,
        compound: impl Iterator<Item = &'a Component<Impl>>,
    ) -> bool {
        let quirks = self.quirks_mode == QuirksMode::Quirks;
        for component in compound {
            let hash = match *component {
                // A mixed-case name may match either spelling.
                Component::LocalName(ref name) if name.name == name.lower_name => {
                    name.name.precomputed_hash()
                },
                Component::DefaultNamespace(ref url) | Component::Namespace(_, ref url) => {
                    url.precomputed_hash()
                },
                // Quirks mode compares ids and classes case-insensitively.
                Component::ID(ref id) if !quirks => id.precomputed_hash(),
                Component::Class(ref class) if !quirks => class.precomputed_hash(),
                // Only a lone alternative is certain to be required.
                Component::Is(ref list) | Component::Where(ref list) => {
                    if let [ref only] = *list.slice() {
                        if !self.add_compound(only.iter()) {
                            return false;
                        }
                    }
                    continue;
                },
                _ => continue,
            };
            self.hashes[self.len] = hash & BLOOM_HASH_MASK;
            self.len += 1;
            if self.len == self.hashes.len() {
                return false;
            }
        }
        true
    }
}

/// The null namespace, as the embedder spells it.
#[inline]
pub fn namespace_empty_string<Impl: SelectorImpl>() -> Impl::NamespaceUrl {
    Impl::NamespaceUrl::default()
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Combinator {
    /// `>`
    Child,
    /// Whitespace.
    Descendant,
    /// `+`
    NextSibling,
    /// `~`
    LaterSibling,
    /// Implied between a compound and the pseudo-element it generates.
    PseudoElement,
    /// Implied before `::slotted()`.
    SlotAssignment,
    /// Implied before `::part()`.
    Part,
}

impl Combinator {
    #[inline]
    pub fn is_sibling(&self) -> bool {
        matches!(*self, Combinator::NextSibling | Combinator::LaterSibling)
    }
}

/// Which member of the `:nth-*` family.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NthType {
    Child,
    LastChild,
    OnlyChild,
    OfType,
    LastOfType,
    OnlyOfType,
}

impl NthType {
    pub fn is_only(self) -> bool {
        matches!(self, NthType::OnlyChild | NthType::OnlyOfType)
    }

    pub fn is_of_type(self) -> bool {
        matches!(self, NthType::OfType | NthType::LastOfType | NthType::OnlyOfType)
    }

    pub fn is_from_end(self) -> bool {
        matches!(self, NthType::LastChild | NthType::LastOfType)
    }
}

/// `An+B` and which siblings it counts. `is_function` tells
/// `:nth-child(1)` apart from `:first-child`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NthSelectorData {
    pub ty: NthType,
    pub is_function: bool,
    pub a: i32,
    pub b: i32,
}

impl NthSelectorData {
    const fn edge(ty: NthType) -> Self {
        NthSelectorData {
            ty,
            is_function: false,
            a: 0,
            b: 1,
        }
    }

    /// `:first-child` or `:first-of-type`.
    pub const fn first(of_type: bool) -> Self {
        Self::edge(if of_type { NthType::OfType } else { NthType::Child })
    }

    /// `:last-child` or `:last-of-type`.
    pub const fn last(of_type: bool) -> Self {
        Self::edge(if of_type {
            NthType::LastOfType
        } else {
            NthType::LastChild
        })
    }

    /// `:only-child` or `:only-of-type`.
    pub const fn only(of_type: bool) -> Self {
        Self::edge(if of_type {
            NthType::OnlyOfType
        } else {
            NthType::OnlyChild
        })
    }

    /// `:first-child` or `:last-child`, which need no counting.
    #[inline]
    pub fn is_simple_edge(&self) -> bool {
        self.a == 0 && self.b == 1 && !self.ty.is_of_type() && !self.ty.is_only()
    }
}

/// `:nth-child(An+B of S)` and `:nth-last-child(An+B of S)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NthOfSelectorData<Impl: SelectorImpl> {
    nth_data: NthSelectorData,
    selectors: Box<[Selector<Impl>]>,
}

impl<Impl: SelectorImpl> NthOfSelectorData<Impl> {
    pub fn new<I>(nth_data: &NthSelectorData, selectors: I) -> Self
    where
        I: Iterator<Item = Selector<Impl>>,
    {
        NthOfSelectorData {
            nth_data: *nth_data,
            selectors: selectors.collect(),
        }
    }

    #[inline]
    pub fn nth_data(&self) -> &NthSelectorData {
        &self.nth_data
    }

    #[inline]
    pub fn selectors(&self) -> &[Selector<Impl>] {
        &self.selectors
    }
}

/// Where, relative to the anchor, a `:has()` argument can match. Derived
/// from the argument's combinators so matching visits as little as possible.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RelativeSelectorMatchHint {
    InChild,
    InSubtree,
    InSibling,
    InSiblingSubtree,
    InNextSibling,
    InNextSiblingSubtree,
}

impl RelativeSelectorMatchHint {
    /// `leading` is the combinator right after the anchor. `descends` and
    /// `crosses_siblings` say whether any later combinator goes down the tree
    /// or across siblings.
    pub fn new(leading: Combinator, descends: bool, crosses_siblings: bool) -> Self {
        use self::RelativeSelectorMatchHint::*;
        match (leading, descends, crosses_siblings) {
            (Combinator::Descendant, _, _) | (Combinator::Child, true, _) => InSubtree,
            (Combinator::Child, false, _) => InChild,
            (Combinator::NextSibling, false, false) => InNextSibling,
            (Combinator::NextSibling, true, false) => InNextSiblingSubtree,
            (Combinator::NextSibling, false, true) | (Combinator::LaterSibling, false, _) => {
                InSibling
            },
            (Combinator::NextSibling, true, true) | (Combinator::LaterSibling, true, _) => {
                InSiblingSubtree
            },
            (Combinator::Part | Combinator::PseudoElement | Combinator::SlotAssignment, _, _) => {
                debug_assert!(false, "{:?} can't lead a relative selector", leading);
                InSubtree
            },
        }
    }

    /// Whether candidates are the anchor's children (and their subtrees)
    /// rather than its later siblings.
    pub fn is_descendant_direction(&self) -> bool {
        matches!(*self, Self::InChild | Self::InSubtree)
    }

    /// Whether only the anchor's next sibling is a candidate.
    pub fn is_next_sibling(&self) -> bool {
        matches!(*self, Self::InNextSibling | Self::InNextSiblingSubtree)
    }

    /// Whether candidates' subtrees must be searched too.
    pub fn is_subtree(&self) -> bool {
        matches!(
            *self,
            Self::InSubtree | Self::InSiblingSubtree | Self::InNextSiblingSubtree
        )
    }
}

/// One `:has()` argument.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelativeSelector<Impl: SelectorImpl> {
    pub match_hint: RelativeSelectorMatchHint,
    /// Reads `<anchor> <combinator> ...` in parse order.
    pub selector: Selector<Impl>,
}

impl<Impl: SelectorImpl> RelativeSelector<Impl> {
    fn from_selector_list(list: SelectorList<Impl>) -> Box<[Self]> {
        list.slice()
            .iter()
            .map(|selector| {
                debug_assert_eq!(
                    selector.iter_raw_parse_order_from(0).next(),
                    Some(&Component::RelativeSelectorAnchor)
                );
                let mut descends = false;
                let mut crosses_siblings = false;
                for combinator in selector
                    .iter_raw_parse_order_from(2)
                    .filter_map(Component::as_combinator)
                {
                    match combinator {
                        Combinator::Child | Combinator::Descendant => descends = true,
                        Combinator::NextSibling | Combinator::LaterSibling => {
                            crosses_siblings = true
                        },
                        _ => {},
                    }
                }
                RelativeSelector {
                    match_hint: RelativeSelectorMatchHint::new(
                        selector.combinator_at_parse_order(1),
                        descends,
                        crosses_siblings,
                    ),
                    selector: selector.clone(),
                }
            })
            .collect()
    }
}

/// A simple selector or a combinator. Both live in one flat buffer per
/// selector.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Component<Impl: SelectorImpl> {
    LocalName(LocalName<Impl>),

    ID(Impl::Identifier),
    Class(Impl::Identifier),

    /// `[name]`
    AttributeInNoNamespaceExists {
        local_name: Impl::LocalName,
        local_name_lower: Impl::LocalName,
    },
    /// `[name op value]` with an already-lowercase name and no namespace.
    AttributeInNoNamespace {
        local_name: Impl::LocalName,
        operator: AttrSelectorOperator,
        value: Impl::AttrValue,
        case_sensitivity: ParsedCaseSensitivity,
        never_matches: bool,
    },
    /// Every other attribute selector, boxed to keep `Component` small.
    AttributeOther(Box<AttrSelectorWithOptionalNamespace<Impl>>),

    /// `*`
    ExplicitUniversalType,
    /// `*|`, kept only when a default namespace would otherwise apply.
    ExplicitAnyNamespace,
    /// `|`
    ExplicitNoNamespace,
    DefaultNamespace(Impl::NamespaceUrl),
    Namespace(Impl::NamespacePrefix, Impl::NamespaceUrl),

    /// `:not(S)`, with a full selector list.
    Negation(SelectorList<Impl>),
    Root,
    Empty,
    Scope,
    /// An unresolved `&`.
    ParentSelector,
    Nth(NthSelectorData),
    NthOf(NthOfSelectorData<Impl>),
    NonTSPseudoClass(Impl::NonTSPseudoClass),
    /// `::slotted(compound)`. Parsed but never matched, since shadow trees
    /// are not modelled.
    Slotted(Selector<Impl>),
    /// `::part(name...)`. Never matched either.
    Part(Box<[Impl::Identifier]>),
    /// `:host` or `:host(compound)`. Never matched either.
    Host(Option<Selector<Impl>>),
    /// `:where(S)`, which adds no specificity.
    Where(SelectorList<Impl>),
    /// `:is(S)`, which weighs as its most specific alternative.
    Is(SelectorList<Impl>),
    Has(Box<[RelativeSelector<Impl>]>),
    PseudoElement(Impl::PseudoElement),

    Combinator(Combinator),

    /// The `:has()` anchor, leftmost in each of its arguments.
    RelativeSelectorAnchor,
}

impl<Impl: SelectorImpl> Component<Impl> {
    #[inline]
    pub fn is_combinator(&self) -> bool {
        matches!(*self, Component::Combinator(_))
    }

    #[inline]
    pub fn as_combinator(&self) -> Option<Combinator> {
        match *self {
            Component::Combinator(combinator) => Some(combinator),
            _ => None,
        }
    }

    fn replace_parent_selector(&self, parent: &SelectorList<Impl>) -> Self {
        let replace = |selector: &Selector<Impl>| selector.replace_parent_selector(parent);
        match *self {
            Component::ParentSelector => Component::Is(parent.clone()),
            Component::Is(ref list) => Component::Is(list.replace_parent_selector(parent)),
            Component::Where(ref list) => Component::Where(list.replace_parent_selector(parent)),
            Component::Negation(ref list) => {
                Component::Negation(list.replace_parent_selector(parent))
            },
            Component::NthOf(ref nth_of) => Component::NthOf(NthOfSelectorData::new(
                nth_of.nth_data(),
                nth_of.selectors().iter().map(replace),
            )),
            Component::Has(ref relative) => Component::Has(
                relative
                    .iter()
                    .map(|relative| RelativeSelector {
                        match_hint: relative.match_hint,
                        selector: replace(&relative.selector),
                    })
                    .collect(),
            ),
            Component::Slotted(ref selector) => Component::Slotted(replace(selector)),
            Component::Host(Some(ref selector)) => Component::Host(Some(replace(selector))),
            ref other => other.clone(),
        }
    }
}

/// A type selector's name as written and lowercased. HTML elements in HTML
/// documents compare against `lower_name`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocalName<Impl: SelectorImpl> {
    pub name: Impl::LocalName,
    pub lower_name: Impl::LocalName,
}

bitflags! {
    /// Restrictions inherited from the enclosing context, plus what the
    /// compound being parsed has already seen.
    #[derive(Clone, Copy, Debug)]
    struct ParseState: u16 {
        /// Inside a selector argument, where compounds without a type
        /// selector get no implicit default namespace.
        const INNER_LIST = 1 << 0;
        const NO_COMBINATORS = 1 << 1;
        const NO_PSEUDO_ELEMENTS = 1 << 2;
        const NO_HAS = 1 << 3;
        const SEEN_SLOTTED = 1 << 4;
        const SEEN_PART = 1 << 5;
        const SEEN_PSEUDO_ELEMENT = 1 << 6;
        /// A pseudo-element that takes no state pseudo-classes after it.
        const SEEN_STATELESS_PSEUDO_ELEMENT = 1 << 7;
        const SEEN_ANY_PSEUDO = Self::SEEN_SLOTTED.bits() |
            Self::SEEN_PART.bits() |
            Self::SEEN_PSEUDO_ELEMENT.bits();
    }
}

impl ParseState {
    fn allows_pseudo_elements(self) -> bool {
        // `::part(a)::before` is fine, so only a real pseudo-element counts.
        !self.intersects(Self::SEEN_PSEUDO_ELEMENT | Self::NO_PSEUDO_ELEMENTS)
    }

    fn allows_slotted_or_part(self) -> bool {
        !self.intersects(Self::SEEN_ANY_PSEUDO | Self::NO_PSEUDO_ELEMENTS)
    }

    fn allows_non_functional_pseudo_classes(self) -> bool {
        !self.intersects(Self::SEEN_SLOTTED | Self::SEEN_STATELESS_PSEUDO_ELEMENT)
    }

    fn allows_tree_structural_pseudo_classes(self) -> bool {
        !self.intersects(Self::SEEN_ANY_PSEUDO)
    }

    fn after_pseudo_error<'i>(self) -> SelectorParseErrorKind<'i> {
        if self.contains(Self::SEEN_SLOTTED) {
            SelectorParseErrorKind::NonPseudoElementAfterSlotted
        } else {
            SelectorParseErrorKind::InvalidState
        }
    }

    /// Fails for simple selectors that can't follow a pseudo-element.
    fn ensure_not_after_pseudo<'i, 't>(
        self,
        input: &CssParser<'i, 't>,
    ) -> Result<(), SelectorParseError<'i>> {
        if self.intersects(Self::SEEN_ANY_PSEUDO) {
            return Err(input.new_custom_error(self.after_pseudo_error()));
        }
        Ok(())
    }
}

/// Whether a bad alternative fails the whole list, or is dropped as inside
/// `:is()` and `:where()`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Recovery {
    Strict,
    Forgiving,
}

fn parse_list<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    state: ParseState,
    recovery: Recovery,
    parse_relative: ParseRelative,
    depth: usize,
) -> Result<SelectorList<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let mut selectors = SmallVec::new();
    loop {
        let parsed = input.parse_until_before(Delimiter::Comma, |input| {
            parse_selector(parser, input, state, parse_relative, depth)
        });
        match parsed {
            Ok(selector) => selectors.push(selector),
            // Too deep is too deep, forgiving or not.
            Err(error) if recovery == Recovery::Forgiving && !is_nesting_error(&error) => {
                trace!("Dropping invalid alternative: {:?}", error);
            },
            Err(error) => return Err(error),
        }
        // Either the comma or the end of the input.
        if input.next().is_err() {
            break;
        }
    }
    Ok(SelectorList(selectors))
}

fn is_nesting_error(error: &SelectorParseError) -> bool {
    matches!(
        error.kind,
        ParseErrorKind::Custom(SelectorParseErrorKind::NestingTooDeep)
    )
}

/// complex-selector = compound [ combinator compound ]*
fn parse_selector<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    mut state: ParseState,
    parse_relative: ParseRelative,
    depth: usize,
) -> Result<Selector<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    if depth > MAX_NESTING_DEPTH {
        return Err(input.new_custom_error(SelectorParseErrorKind::NestingTooDeep));
    }

    let mut builder = SelectorBuilder::default();
    match parse_relative {
        ParseRelative::No => {},
        ParseRelative::ForHas => {
            let leading = parse_combinator(input).unwrap_or(Combinator::Descendant);
            builder.push_simple_selector(Component::RelativeSelectorAnchor);
            builder.push_combinator(leading);
        },
        ParseRelative::ForNesting => {
            if let Some(leading) = parse_combinator(input) {
                builder.push_simple_selector(Component::ParentSelector);
                builder.push_combinator(leading);
            }
        },
    }

    loop {
        if !parse_compound(parser, &mut state, input, &mut builder, depth)? {
            let kind = if builder.has_combinators() {
                SelectorParseErrorKind::DanglingCombinator
            } else {
                SelectorParseErrorKind::EmptySelector
            };
            return Err(input.new_custom_error(kind));
        }
        // A pseudo-element ends the selector.
        if state.intersects(ParseState::SEEN_ANY_PSEUDO) {
            break;
        }
        let Some(combinator) = parse_combinator(input) else {
            break;
        };
        if state.contains(ParseState::NO_COMBINATORS) {
            return Err(input.new_custom_error(SelectorParseErrorKind::InvalidState));
        }
        builder.push_combinator(combinator);
    }

    Ok(builder.build(parse_relative))
}

/// Reads `>`, `+`, `~` or bare whitespace (the descendant combinator).
/// Leaves `input` at the next compound, or untouched when there's none.
fn parse_combinator<'i, 't>(input: &mut CssParser<'i, 't>) -> Option<Combinator> {
    let mut saw_whitespace = false;
    loop {
        let before = input.state();
        let combinator = match input.next_including_whitespace() {
            Ok(&Token::WhiteSpace(_)) => {
                saw_whitespace = true;
                continue;
            },
            Ok(&Token::Delim('>')) => Combinator::Child,
            Ok(&Token::Delim('+')) => Combinator::NextSibling,
            Ok(&Token::Delim('~')) => Combinator::LaterSibling,
            // Trailing whitespace combines nothing.
            Err(_) => return None,
            Ok(_) => {
                input.reset(&before);
                return saw_whitespace.then_some(Combinator::Descendant);
            },
        };
        return Some(combinator);
    }
}

/// Pushes one compound into `builder`, returning whether it had anything.
fn parse_compound<'i, 't, P, Impl>(
    parser: &P,
    state: &mut ParseState,
    input: &mut CssParser<'i, 't>,
    builder: &mut SelectorBuilder<Impl>,
    depth: usize,
) -> Result<bool, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    input.skip_whitespace();
    let mut any = parse_type_selector(parser, input, *state, builder)?;

    while let Some(simple) = parse_simple_selector(parser, input, *state, depth)? {
        if !any {
            // No type selector: the default namespace still applies, except
            // to subjects of selector arguments and to `:host`.
            let exempt = state.contains(ParseState::INNER_LIST) ||
                matches!(simple, Simple::Component(Component::Host(..)));
            if let Some(url) = parser.default_namespace().filter(|_| !exempt) {
                builder.push_simple_selector(Component::DefaultNamespace(url));
            }
            any = true;
        }

        match simple {
            Simple::Component(component) => builder.push_simple_selector(component),
            Simple::PseudoElement(pseudo) => {
                state.insert(ParseState::SEEN_PSEUDO_ELEMENT);
                if !pseudo.accepts_state_pseudo_classes() {
                    state.insert(ParseState::SEEN_STATELESS_PSEUDO_ELEMENT);
                }
                builder.push_combinator(Combinator::PseudoElement);
                builder.push_simple_selector(Component::PseudoElement(pseudo));
            },
            Simple::Slotted(selector) => {
                state.insert(ParseState::SEEN_SLOTTED);
                builder.push_combinator(Combinator::SlotAssignment);
                builder.push_simple_selector(Component::Slotted(selector));
            },
            Simple::Part(names) => {
                state.insert(ParseState::SEEN_PART);
                builder.push_combinator(Combinator::Part);
                builder.push_simple_selector(Component::Part(names));
            },
        }
    }
    Ok(any)
}

/// The namespace side of a qualified name.
enum QualifiedPrefix<Impl: SelectorImpl> {
    /// No `|` at all.
    Unprefixed,
    /// `|name`
    NoNamespace,
    /// `*|name`
    AnyNamespace,
    /// `prefix|name`
    Namespace(Impl::NamespacePrefix, Impl::NamespaceUrl),
}

struct QualifiedName<'i, Impl: SelectorImpl> {
    prefix: QualifiedPrefix<Impl>,
    /// `None` for `*`.
    local_name: Option<CowRcStr<'i>>,
}

/// Reads `name`, `prefix|name`, `*|name` or `|name`, where `name` may be `*`
/// outside attribute selectors. Returns `None` without consuming anything
/// when the next token can't start a qualified name.
fn parse_qualified_name<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    in_attribute: bool,
) -> Result<Option<QualifiedName<'i, Impl>>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let unprefixed = |local_name| {
        Ok(Some(QualifiedName {
            prefix: QualifiedPrefix::Unprefixed,
            local_name,
        }))
    };

    let start = input.state();
    let prefix = match input.next_including_whitespace() {
        Ok(&Token::Ident(ref ident)) => {
            let ident = ident.clone();
            let after_ident = input.state();
            if !matches!(input.next_including_whitespace(), Ok(&Token::Delim('|'))) {
                input.reset(&after_ident);
                return unprefixed(Some(ident));
            }
            let prefix = parser.namespace_prefix(&ident);
            let Some(url) = parser.namespace_for_prefix(&prefix) else {
                return Err(after_ident
                    .source_location()
                    .new_custom_error(SelectorParseErrorKind::ExpectedNamespace(ident)));
            };
            QualifiedPrefix::Namespace(prefix, url)
        },
        Ok(&Token::Delim('*')) => {
            let after_star = input.state();
            match input.next_including_whitespace() {
                Ok(&Token::Delim('|')) => QualifiedPrefix::AnyNamespace,
                Ok(token) if in_attribute => {
                    let token = token.clone();
                    return Err(after_star
                        .source_location()
                        .new_custom_error(SelectorParseErrorKind::ExpectedBarInAttr(token)));
                },
                Err(error) if in_attribute => return Err(error.into()),
                _ => {
                    input.reset(&after_star);
                    return unprefixed(None);
                },
            }
        },
        Ok(&Token::Delim('|')) => QualifiedPrefix::NoNamespace,
        _ => {
            input.reset(&start);
            return Ok(None);
        },
    };

    let location = input.current_source_location();
    let local_name = match *input.next_including_whitespace()? {
        Token::Ident(ref name) => Some(name.clone()),
        Token::Delim('*') if !in_attribute => None,
        ref token => {
            let kind = if in_attribute {
                SelectorParseErrorKind::InvalidQualNameInAttr(token.clone())
            } else {
                SelectorParseErrorKind::ExplicitNamespaceUnexpectedToken(token.clone())
            };
            return Err(location.new_custom_error(kind));
        },
    };
    Ok(Some(QualifiedName { prefix, local_name }))
}

/// Parses a type or universal selector with its namespace, if one is next.
fn parse_type_selector<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    state: ParseState,
    builder: &mut SelectorBuilder<Impl>,
) -> Result<bool, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let Some(name) = parse_qualified_name(parser, input, false)? else {
        return Ok(false);
    };
    state.ensure_not_after_pseudo(input)?;

    let default = parser.default_namespace();
    let namespace = match name.prefix {
        QualifiedPrefix::Unprefixed => default.map(Component::DefaultNamespace),
        QualifiedPrefix::NoNamespace => Some(Component::ExplicitNoNamespace),
        // `*|` only differs from nothing when there is a default namespace.
        QualifiedPrefix::AnyNamespace => default.map(|_| Component::ExplicitAnyNamespace),
        QualifiedPrefix::Namespace(prefix, url) => Some(if default.as_ref() == Some(&url) {
            Component::DefaultNamespace(url)
        } else {
            Component::Namespace(prefix, url)
        }),
    };
    if let Some(namespace) = namespace {
        builder.push_simple_selector(namespace);
    }

    builder.push_simple_selector(match name.local_name {
        Some(local_name) => Component::LocalName(LocalName {
            lower_name: (&*ascii_lowercase(&local_name)).into(),
            name: local_name.as_ref().into(),
        }),
        None => Component::ExplicitUniversalType,
    });
    Ok(true)
}

/// Lowercases ASCII letters only, borrowing when nothing changes.
fn ascii_lowercase(s: &str) -> Cow<str> {
    match s.bytes().position(|byte| byte.is_ascii_uppercase()) {
        None => Cow::Borrowed(s),
        Some(first_upper) => {
            let mut lowered = s.to_owned();
            lowered[first_upper..].make_ascii_lowercase();
            Cow::Owned(lowered)
        },
    }
}

/// What one simple selector produced. Pseudo-elements, `::slotted()` and
/// `::part()` are told apart because each brings its own combinator.
enum Simple<Impl: SelectorImpl> {
    Component(Component<Impl>),
    PseudoElement(Impl::PseudoElement),
    Slotted(Selector<Impl>),
    Part(Box<[Impl::Identifier]>),
}

/// Parses anything but a type selector. Returns `None` without consuming
/// anything at the end of the compound.
fn parse_simple_selector<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    state: ParseState,
    depth: usize,
) -> Result<Option<Simple<Impl>>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let start = input.state();
    let token = match input.next_including_whitespace() {
        Ok(token) => token.clone(),
        Err(_) => {
            input.reset(&start);
            return Ok(None);
        },
    };

    let component = match token {
        Token::IDHash(ref id) => {
            state.ensure_not_after_pseudo(input)?;
            Component::ID(id.as_ref().into())
        },
        Token::Delim('.') => {
            state.ensure_not_after_pseudo(input)?;
            let location = input.current_source_location();
            match *input.next_including_whitespace()? {
                Token::Ident(ref class) => Component::Class(class.as_ref().into()),
                ref token => {
                    return Err(location
                        .new_custom_error(SelectorParseErrorKind::ClassNeedsIdent(token.clone())))
                },
            }
        },
        Token::Delim('&') if parser.parse_parent_selector() => {
            state.ensure_not_after_pseudo(input)?;
            Component::ParentSelector
        },
        Token::SquareBracketBlock => {
            state.ensure_not_after_pseudo(input)?;
            input.parse_nested_block(|input| parse_attribute_selector(parser, input))?
        },
        Token::Colon => return parse_pseudo(parser, input, state, depth).map(Some),
        _ => {
            input.reset(&start);
            return Ok(None);
        },
    };
    Ok(Some(Simple::Component(component)))
}

/// `[name]`, `[ns|name op value flag]` and the rest. `input` is the block's
/// contents.
fn parse_attribute_selector<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
) -> Result<Component<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    input.skip_whitespace();
    let location = input.current_source_location();
    let (prefix, local_name) = match parse_qualified_name(parser, input, true)? {
        Some(QualifiedName {
            prefix,
            local_name: Some(local_name),
        }) => (prefix, local_name),
        Some(QualifiedName { local_name: None, .. }) => {
            return Err(location.new_custom_error(SelectorParseErrorKind::InvalidQualNameInAttr(
                Token::Delim('*'),
            )));
        },
        None => {
            let token = input.next()?.clone();
            return Err(location.new_custom_error(
                SelectorParseErrorKind::NoQualifiedNameInAttributeSelector(token),
            ));
        },
    };
    let namespace = match prefix {
        QualifiedPrefix::Unprefixed | QualifiedPrefix::NoNamespace => None,
        QualifiedPrefix::AnyNamespace => Some(NamespaceConstraint::Any),
        QualifiedPrefix::Namespace(prefix, url) => {
            Some(NamespaceConstraint::Specific((prefix, url)))
        },
    };
    let lowered = ascii_lowercase(&local_name);
    let already_lowercase = matches!(lowered, Cow::Borrowed(_));
    let local_name_lower: Impl::LocalName = (&*lowered).into();
    let local_name: Impl::LocalName = local_name.as_ref().into();

    let location = input.current_source_location();
    let operator = match input.next() {
        Err(_) => {
            return Ok(match namespace {
                None => Component::AttributeInNoNamespaceExists {
                    local_name,
                    local_name_lower,
                },
                namespace @ Some(_) => {
                    Component::AttributeOther(Box::new(AttrSelectorWithOptionalNamespace {
                        namespace,
                        local_name,
                        local_name_lower,
                        operation: ParsedAttrSelectorOperation::Exists,
                        never_matches: false,
                    }))
                },
            });
        },
        Ok(&Token::Delim('=')) => AttrSelectorOperator::Equal,
        Ok(&Token::IncludeMatch) => AttrSelectorOperator::Includes,
        Ok(&Token::DashMatch) => AttrSelectorOperator::DashMatch,
        Ok(&Token::PrefixMatch) => AttrSelectorOperator::Prefix,
        Ok(&Token::SubstringMatch) => AttrSelectorOperator::Substring,
        Ok(&Token::SuffixMatch) => AttrSelectorOperator::Suffix,
        Ok(token) => {
            let token = token.clone();
            return Err(location.new_custom_error(
                SelectorParseErrorKind::UnexpectedTokenInAttributeSelector(token),
            ));
        },
    };

    let value = match input.expect_ident_or_string() {
        Ok(value) => value.clone(),
        Err(BasicParseError {
            kind: BasicParseErrorKind::UnexpectedToken(token),
            location,
        }) => {
            return Err(location.new_custom_error(SelectorParseErrorKind::BadValueInAttr(token)))
        },
        Err(error) => return Err(error.into()),
    };
    let never_matches = operator.never_matches(&value);
    let case_sensitivity = parse_attribute_flags(input)?;
    let value: Impl::AttrValue = value.as_ref().into();

    if namespace.is_none() && already_lowercase {
        return Ok(Component::AttributeInNoNamespace {
            local_name,
            operator,
            value,
            case_sensitivity,
            never_matches,
        });
    }
    Ok(Component::AttributeOther(Box::new(AttrSelectorWithOptionalNamespace {
        namespace,
        local_name,
        local_name_lower,
        operation: ParsedAttrSelectorOperation::WithValue {
            operator,
            case_sensitivity,
            value,
        },
        never_matches,
    })))
}

/// The optional `i` or `s` after an attribute value.
fn parse_attribute_flags<'i, 't>(
    input: &mut CssParser<'i, 't>,
) -> Result<ParsedCaseSensitivity, BasicParseError<'i>> {
    let location = input.current_source_location();
    let token = match input.next() {
        Ok(token) => token.clone(),
        Err(_) => return Ok(ParsedCaseSensitivity::CaseSensitive),
    };
    if let Token::Ident(ref flag) = token {
        if flag.eq_ignore_ascii_case("i") {
            return Ok(ParsedCaseSensitivity::AsciiCaseInsensitive);
        }
        if flag.eq_ignore_ascii_case("s") {
            return Ok(ParsedCaseSensitivity::ExplicitCaseSensitive);
        }
    }
    Err(location.new_basic_unexpected_token_error(token))
}

/// Everything after a colon: pseudo-classes, and pseudo-elements with two
/// colons (or one, for the CSS2 names).
fn parse_pseudo<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    state: ParseState,
    depth: usize,
) -> Result<Simple<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let location = input.current_source_location();
    let (double_colon, token) = match input.next_including_whitespace()?.clone() {
        Token::Colon => (true, input.next_including_whitespace()?.clone()),
        token => (false, token),
    };
    let (name, functional) = match token {
        Token::Ident(name) => (name, false),
        Token::Function(name) => (name, true),
        token => {
            let kind = if double_colon {
                SelectorParseErrorKind::PseudoElementExpectedIdent(token)
            } else {
                SelectorParseErrorKind::NoIdentForPseudo(token)
            };
            return Err(input.new_custom_error(kind));
        },
    };

    if !double_colon && !parser.pseudo_element_allows_single_colon(&name) {
        let pseudo_class = if functional {
            input.parse_nested_block(|input| {
                parse_functional_pseudo_class(parser, input, name, state, depth)
            })?
        } else {
            parse_simple_pseudo_class(parser, location, name, state)?
        };
        return Ok(Simple::Component(pseudo_class));
    }

    if !state.allows_pseudo_elements() {
        let kind = if state.contains(ParseState::NO_PSEUDO_ELEMENTS) {
            SelectorParseErrorKind::InvalidPseudoElementInsideWhere
        } else {
            SelectorParseErrorKind::InvalidState
        };
        return Err(input.new_custom_error(kind));
    }
    if functional {
        return parse_functional_pseudo_element(parser, input, name, state, depth);
    }
    let pseudo = parser.parse_pseudo_element(location, name)?;
    if state.contains(ParseState::SEEN_SLOTTED) && !pseudo.valid_after_slotted() {
        return Err(input.new_custom_error(SelectorParseErrorKind::InvalidPseudoElementAfterSlotted));
    }
    Ok(Simple::PseudoElement(pseudo))
}

/// `::part(name...)` and `::slotted(compound)`.
fn parse_functional_pseudo_element<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    name: CowRcStr<'i>,
    state: ParseState,
    depth: usize,
) -> Result<Simple<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let is_part = parser.parse_part() && name.eq_ignore_ascii_case("part");
    let is_slotted = parser.parse_slotted() && name.eq_ignore_ascii_case("slotted");
    if !is_part && !is_slotted {
        return Err(input.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)));
    }
    if !state.allows_slotted_or_part() {
        return Err(input.new_custom_error(SelectorParseErrorKind::InvalidState));
    }

    if is_slotted {
        let selector = input.parse_nested_block(|input| {
            parse_inner_compound(parser, input, state, depth + 1)
        })?;
        return Ok(Simple::Slotted(selector));
    }
    let names = input.parse_nested_block(|input| {
        let mut names: Vec<Impl::Identifier> = vec![input.expect_ident()?.as_ref().into()];
        while !input.is_exhausted() {
            names.push(input.expect_ident()?.as_ref().into());
        }
        Ok(names.into_boxed_slice())
    })?;
    Ok(Simple::Part(names))
}

/// `:host()` and `::slotted()` take one compound selector.
fn parse_inner_compound<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    state: ParseState,
    depth: usize,
) -> Result<Selector<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let state = state | ParseState::NO_PSEUDO_ELEMENTS | ParseState::NO_COMBINATORS;
    parse_selector(parser, input, state, ParseRelative::No, depth)
}

fn parse_functional_pseudo_class<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    name: CowRcStr<'i>,
    state: ParseState,
    depth: usize,
) -> Result<Component<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    let nth = match_ignore_ascii_case! { &name,
        "nth-child" => Some(NthType::Child),
        "nth-last-child" => Some(NthType::LastChild),
        "nth-of-type" => Some(NthType::OfType),
        "nth-last-of-type" => Some(NthType::LastOfType),
        _ => None,
    };
    if let Some(ty) = nth {
        return parse_nth_pseudo_class(parser, input, state, ty, depth);
    }

    // Selector arguments hold no pseudo-elements.
    let inner = state | ParseState::INNER_LIST | ParseState::NO_PSEUDO_ELEMENTS;
    let depth = depth + 1;
    if name.eq_ignore_ascii_case("not") {
        let list = parse_list(parser, input, inner, Recovery::Strict, ParseRelative::No, depth)?;
        return Ok(Component::Negation(list));
    }
    if parser.parse_is_and_where() && name.eq_ignore_ascii_case("is") {
        let list = parse_list(parser, input, inner, Recovery::Forgiving, ParseRelative::No, depth)?;
        return Ok(Component::Is(list));
    }
    if parser.parse_is_and_where() && name.eq_ignore_ascii_case("where") {
        let list = parse_list(parser, input, inner, Recovery::Forgiving, ParseRelative::No, depth)?;
        return Ok(Component::Where(list));
    }
    if parser.parse_has() && name.eq_ignore_ascii_case("has") {
        if state.contains(ParseState::NO_HAS) {
            return Err(input.new_custom_error(SelectorParseErrorKind::InvalidState));
        }
        let state = inner | ParseState::NO_HAS;
        let list = parse_list(parser, input, state, Recovery::Strict, ParseRelative::ForHas, depth)?;
        return Ok(Component::Has(RelativeSelector::from_selector_list(list)));
    }
    if name.eq_ignore_ascii_case("host") {
        if !state.allows_tree_structural_pseudo_classes() {
            return Err(input.new_custom_error(SelectorParseErrorKind::InvalidState));
        }
        return Ok(Component::Host(Some(parse_inner_compound(parser, input, state, depth)?)));
    }

    state.ensure_not_after_pseudo(input)?;
    parser
        .parse_non_ts_functional_pseudo_class(name, input)
        .map(Component::NonTSPseudoClass)
}

/// `An+B`, optionally followed by `of S` for the `-child` variants.
fn parse_nth_pseudo_class<'i, 't, P, Impl>(
    parser: &P,
    input: &mut CssParser<'i, 't>,
    state: ParseState,
    ty: NthType,
    depth: usize,
) -> Result<Component<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    if !state.allows_tree_structural_pseudo_classes() {
        return Err(input.new_custom_error(state.after_pseudo_error()));
    }
    let (a, b) = parse_nth(input)?;
    let nth = NthSelectorData {
        ty,
        is_function: true,
        a,
        b,
    };
    if input.is_exhausted() {
        return Ok(Component::Nth(nth));
    }

    let location = input.current_source_location();
    let keyword = input.expect_ident()?.clone();
    if ty.is_of_type() || !keyword.eq_ignore_ascii_case("of") {
        return Err(location.new_custom_error(SelectorParseErrorKind::UnexpectedIdent(keyword)));
    }
    let of = parse_list(
        parser,
        input,
        state | ParseState::INNER_LIST | ParseState::NO_PSEUDO_ELEMENTS,
        Recovery::Strict,
        ParseRelative::No,
        depth + 1,
    )?;
    Ok(Component::NthOf(NthOfSelectorData::new(&nth, of.slice().iter().cloned())))
}

fn parse_simple_pseudo_class<'i, P, Impl>(
    parser: &P,
    location: SourceLocation,
    name: CowRcStr<'i>,
    state: ParseState,
) -> Result<Component<Impl>, SelectorParseError<'i>>
where
    P: Parser<'i, Impl = Impl>,
    Impl: SelectorImpl,
{
    if !state.allows_non_functional_pseudo_classes() {
        return Err(location.new_custom_error(state.after_pseudo_error()));
    }
    if state.allows_tree_structural_pseudo_classes() {
        if let Some(component) = structural_pseudo_class(&name) {
            return Ok(component);
        }
    }

    let pseudo_class = match parser.parse_non_ts_pseudo_class(location, name.clone()) {
        Ok(pseudo_class) => pseudo_class,
        // A pseudo-element written with one colon, like `:marker`.
        Err(_) if parser.parse_pseudo_element(location, name.clone()).is_ok() => {
            return Err(location.new_custom_error(
                SelectorParseErrorKind::PseudoElementExpectedColon(Token::Ident(name)),
            ));
        },
        Err(error) => return Err(error),
    };
    if state.contains(ParseState::SEEN_PSEUDO_ELEMENT) && !pseudo_class.is_user_action_state() {
        return Err(location.new_custom_error(SelectorParseErrorKind::InvalidState));
    }
    Ok(Component::NonTSPseudoClass(pseudo_class))
}

/// Pseudo-classes this crate matches itself.
fn structural_pseudo_class<Impl: SelectorImpl>(name: &str) -> Option<Component<Impl>> {
    Some(match_ignore_ascii_case! { name,
        "root" => Component::Root,
        "empty" => Component::Empty,
        "scope" => Component::Scope,
        "host" => Component::Host(None),
        "first-child" => Component::Nth(NthSelectorData::first(false)),
        "last-child" => Component::Nth(NthSelectorData::last(false)),
        "only-child" => Component::Nth(NthSelectorData::only(false)),
        "first-of-type" => Component::Nth(NthSelectorData::first(true)),
        "last-of-type" => Component::Nth(NthSelectorData::last(true)),
        "only-of-type" => Component::Nth(NthSelectorData::only(true)),
        _ => return None,
    })
}
