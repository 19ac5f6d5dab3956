/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The pseudo-classes and pseudo-elements supported by the style system, and
//! the namespace-aware parser that produces selectors over them.

#![deny(missing_docs)]

use crate::atoms::{Atom, LocalName, Namespace, Prefix};
use crate::dom::ElementState;
use cssparser::serialize_identifier;
use cssparser::{CowRcStr, Parser as CssParser, ParserInput, SourceLocation, ToCss};
use rustc_hash::FxHashMap;
use selectors::parser::{ParseRelative, SelectorParseError, SelectorParseErrorKind};
use selectors::SelectorList;
use std::fmt;

/// The pseudo-elements rules may style.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(missing_docs)]
pub enum PseudoElement {
    After,
    Before,
    FirstLetter,
    FirstLine,
    Marker,
    Placeholder,
    Selection,
}

impl PseudoElement {
    const ALL: [PseudoElement; 7] = [
        PseudoElement::After,
        PseudoElement::Before,
        PseudoElement::FirstLetter,
        PseudoElement::FirstLine,
        PseudoElement::Marker,
        PseudoElement::Placeholder,
        PseudoElement::Selection,
    ];

    /// The name after `::`.
    pub fn keyword(&self) -> &'static str {
        match *self {
            PseudoElement::After => "after",
            PseudoElement::Before => "before",
            PseudoElement::FirstLetter => "first-letter",
            PseudoElement::FirstLine => "first-line",
            PseudoElement::Marker => "marker",
            PseudoElement::Placeholder => "placeholder",
            PseudoElement::Selection => "selection",
        }
    }

    fn from_keyword(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pseudo| name.eq_ignore_ascii_case(pseudo.keyword()))
    }
}

impl ::selectors::parser::PseudoElement for PseudoElement {
    type Impl = SelectorImpl;

    fn accepts_state_pseudo_classes(&self) -> bool {
        *self != PseudoElement::Marker
    }

    fn valid_after_slotted(&self) -> bool {
        matches!(
            *self,
            PseudoElement::After | PseudoElement::Before | PseudoElement::Marker
        )
    }
}

impl ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str("::")?;
        dest.write_str(self.keyword())
    }
}

/// The pseudo-classes whose state comes from the document rather than from
/// tree position.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(missing_docs)]
pub enum NonTSPseudoClass {
    Active,
    AnyLink,
    Checked,
    Disabled,
    Enabled,
    Focus,
    FocusWithin,
    Hover,
    Indeterminate,
    Lang(Box<str>),
    Link,
    PlaceholderShown,
    ReadOnly,
    ReadWrite,
    Target,
    Visited,
}

impl NonTSPseudoClass {
    /// Every pseudo-class written without arguments.
    const KEYWORDS: [NonTSPseudoClass; 15] = [
        NonTSPseudoClass::Active,
        NonTSPseudoClass::AnyLink,
        NonTSPseudoClass::Checked,
        NonTSPseudoClass::Disabled,
        NonTSPseudoClass::Enabled,
        NonTSPseudoClass::Focus,
        NonTSPseudoClass::FocusWithin,
        NonTSPseudoClass::Hover,
        NonTSPseudoClass::Indeterminate,
        NonTSPseudoClass::Link,
        NonTSPseudoClass::PlaceholderShown,
        NonTSPseudoClass::ReadOnly,
        NonTSPseudoClass::ReadWrite,
        NonTSPseudoClass::Target,
        NonTSPseudoClass::Visited,
    ];

    /// The name after `:`, without arguments.
    pub fn keyword(&self) -> &'static str {
        use self::NonTSPseudoClass::*;
        match *self {
            Active => "active",
            AnyLink => "any-link",
            Checked => "checked",
            Disabled => "disabled",
            Enabled => "enabled",
            Focus => "focus",
            FocusWithin => "focus-within",
            Hover => "hover",
            Indeterminate => "indeterminate",
            Lang(..) => "lang",
            Link => "link",
            PlaceholderShown => "placeholder-shown",
            ReadOnly => "read-only",
            ReadWrite => "read-write",
            Target => "target",
            Visited => "visited",
        }
    }

    fn from_keyword(name: &str) -> Option<Self> {
        Self::KEYWORDS
            .into_iter()
            .find(|pseudo_class| name.eq_ignore_ascii_case(pseudo_class.keyword()))
    }

    /// The `ElementState` bit the element must carry to match. Empty for
    /// pseudo-classes decided some other way.
    pub fn state_flag(&self) -> ElementState {
        use self::NonTSPseudoClass::*;
        match *self {
            Active => ElementState::ACTIVE,
            Checked => ElementState::CHECKED,
            Disabled => ElementState::DISABLED,
            Enabled => ElementState::ENABLED,
            Focus => ElementState::FOCUS,
            FocusWithin => ElementState::FOCUS_WITHIN,
            Hover => ElementState::HOVER,
            Indeterminate => ElementState::INDETERMINATE,
            PlaceholderShown => ElementState::PLACEHOLDER_SHOWN,
            ReadOnly | ReadWrite => ElementState::READ_WRITE,
            Target => ElementState::TARGET,
            AnyLink | Lang(_) | Link | Visited => ElementState::empty(),
        }
    }
}

impl ::selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = SelectorImpl;

    fn is_user_action_state(&self) -> bool {
        matches!(
            *self,
            NonTSPseudoClass::Active | NonTSPseudoClass::Hover | NonTSPseudoClass::Focus
        )
    }
}

impl ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_char(':')?;
        dest.write_str(self.keyword())?;
        if let NonTSPseudoClass::Lang(ref lang) = *self {
            dest.write_char('(')?;
            serialize_identifier(lang, dest)?;
            dest.write_char(')')?;
        }
        Ok(())
    }
}

/// Binds the crate's atoms and pseudo types into the selector engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectorImpl;

impl ::selectors::SelectorImpl for SelectorImpl {
    type AttrValue = Atom;
    type Identifier = Atom;
    type LocalName = LocalName;
    type NamespaceUrl = Namespace;
    type NamespacePrefix = Prefix;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// The namespaces in scope for a style sheet, as declared by `@namespace`
/// rules.
#[derive(Clone, Debug, Default)]
pub struct Namespaces {
    /// The default namespace, if any.
    pub default: Option<Namespace>,
    /// Map from prefix to namespace URL.
    pub prefixes: FxHashMap<Prefix, Namespace>,
}

/// The selector parser of the style system.
pub struct SelectorParser<'a> {
    /// The namespace set of the stylesheet.
    pub namespaces: &'a Namespaces,
}

impl<'a> SelectorParser<'a> {
    /// Parses with no `@namespace` rules in scope, as `querySelector` does.
    pub fn parse_no_namespace(
        input: &str,
    ) -> Result<SelectorList<SelectorImpl>, SelectorParseError<'_>> {
        let namespaces = Namespaces::default();
        let parser = SelectorParser {
            namespaces: &namespaces,
        };
        parser.parse(input, ParseRelative::No)
    }

    /// Parses all of `input` as one selector list.
    pub fn parse<'i>(
        &self,
        input: &'i str,
        parse_relative: ParseRelative,
    ) -> Result<SelectorList<SelectorImpl>, SelectorParseError<'i>> {
        let mut input = ParserInput::new(input);
        let mut parser = CssParser::new(&mut input);
        let list = SelectorList::parse(self, &mut parser, parse_relative)?;
        parser.expect_exhausted()?;
        Ok(list)
    }
}

impl<'a, 'i> ::selectors::Parser<'i> for SelectorParser<'a> {
    type Impl = SelectorImpl;

    fn parse_slotted(&self) -> bool {
        true
    }

    fn parse_part(&self) -> bool {
        true
    }

    fn parse_is_and_where(&self) -> bool {
        true
    }

    fn parse_has(&self) -> bool {
        true
    }

    fn parse_parent_selector(&self) -> bool {
        true
    }

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<NonTSPseudoClass, SelectorParseError<'i>> {
        NonTSPseudoClass::from_keyword(&name).ok_or_else(|| {
            location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name))
        })
    }

    fn parse_non_ts_functional_pseudo_class<'t>(
        &self,
        name: CowRcStr<'i>,
        arguments: &mut CssParser<'i, 't>,
    ) -> Result<NonTSPseudoClass, SelectorParseError<'i>> {
        if !name.eq_ignore_ascii_case("lang") {
            return Err(arguments.new_custom_error(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
            ));
        }
        let lang: &str = arguments.expect_ident_or_string()?;
        Ok(NonTSPseudoClass::Lang(lang.into()))
    }

    fn parse_pseudo_element(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoElement, SelectorParseError<'i>> {
        PseudoElement::from_keyword(&name).ok_or_else(|| {
            location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name))
        })
    }

    fn default_namespace(&self) -> Option<Namespace> {
        self.namespaces.default.clone()
    }

    fn namespace_for_prefix(&self, prefix: &Prefix) -> Option<Namespace> {
        self.namespaces.prefixes.get(prefix).cloned()
    }
}
