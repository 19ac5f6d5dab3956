/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::dom::parse;
use cssparser::{ParseError, ParseErrorKind};
use selectors::parser::{ParseRelative, SelectorParseErrorKind, MAX_NESTING_DEPTH};
use selectors::Specificity;
use style::selector_parser::{Namespaces, PseudoElement, SelectorParser};

fn specificity(input: &str) -> u32 {
    let list = parse(input);
    assert_eq!(list.len(), 1, "{}", input);
    list.slice()[0].specificity()
}

fn packed(ids: u32, classes: u32, types: u32) -> u32 {
    Specificity::new(ids, classes, types).into()
}

fn error_kind(input: &str, parse_relative: ParseRelative) -> Option<SelectorParseErrorKind> {
    let namespaces = Namespaces::default();
    let parser = SelectorParser {
        namespaces: &namespaces,
    };
    match parser.parse(input, parse_relative) {
        Ok(_) => None,
        Err(ParseError {
            kind: ParseErrorKind::Custom(kind),
            ..
        }) => Some(kind),
        Err(e) => panic!("Unexpected basic error for {:?}: {:?}", input, e),
    }
}

#[test]
fn compound_and_complex_specificity() {
    assert_eq!(specificity("div.foo > #bar:hover"), (1 << 20) | (2 << 10) | 1);
    assert_eq!(specificity("div.foo > #bar:hover"), packed(1, 2, 1));
    assert_eq!(specificity("*"), 0);
    assert_eq!(specificity("ul li:nth-child(2n+1)"), packed(0, 1, 2));
    assert_eq!(specificity("a[href]:not(.b)"), packed(0, 2, 1));
    assert_eq!(specificity("p::before"), packed(0, 0, 2));
    assert_eq!(specificity("input:checked + label:focus"), packed(0, 2, 2));
}

#[test]
fn selector_list_members_are_independent() {
    let list = parse("a, b");
    assert_eq!(list.len(), 2);
    assert!(list.slice().iter().all(|s| s.specificity() == packed(0, 0, 1)));

    let list = parse("#a, .b, c");
    let specificities: Vec<_> = list.slice().iter().map(|s| s.specificity()).collect();
    assert_eq!(specificities, vec![packed(1, 0, 0), packed(0, 1, 0), packed(0, 0, 1)]);
}

#[test]
fn where_contributes_nothing_but_is_contributes_its_most_specific_argument() {
    assert_eq!(specificity(":where(.a)"), 0);
    assert_eq!(specificity(":where(#a, .b) span"), packed(0, 0, 1));
    assert_eq!(specificity(":is(.a)"), packed(0, 1, 0));
    assert_eq!(specificity(":is(#a, .b)"), packed(1, 0, 0));
    assert_eq!(specificity(":not(#a, .b)"), packed(1, 0, 0));
    assert_eq!(specificity(":has(> #a .b)"), packed(1, 1, 0));
    assert_eq!(specificity(":nth-child(2 of #a, .b)"), packed(1, 1, 0));
}

#[test]
fn pseudo_elements_are_recorded_on_the_selector() {
    let list = parse("div::after, div");
    assert_eq!(list.slice()[0].pseudo_element(), Some(&PseudoElement::After));
    assert!(list.slice()[0].has_pseudo_element());
    assert_eq!(list.slice()[1].pseudo_element(), None);

    // CSS2 pseudo-elements also parse with a single colon.
    assert_eq!(parse("p:first-line").slice()[0].pseudo_element(), Some(&PseudoElement::FirstLine));
    assert_eq!(
        error_kind("p:marker", ParseRelative::No),
        Some(SelectorParseErrorKind::PseudoElementExpectedColon(
            cssparser::Token::Ident("marker".into())
        ))
    );
}

#[test]
fn invalid_selectors() {
    assert_eq!(error_kind("", ParseRelative::No), Some(SelectorParseErrorKind::EmptySelector));
    assert_eq!(
        error_kind("a >", ParseRelative::No),
        Some(SelectorParseErrorKind::DanglingCombinator)
    );
    assert_eq!(
        error_kind("> a", ParseRelative::No),
        Some(SelectorParseErrorKind::EmptySelector)
    );
    assert_eq!(
        error_kind(":unknown", ParseRelative::No),
        Some(SelectorParseErrorKind::UnsupportedPseudoClassOrElement("unknown".into()))
    );
    assert_eq!(
        error_kind("::unknown", ParseRelative::No),
        Some(SelectorParseErrorKind::UnsupportedPseudoClassOrElement("unknown".into()))
    );
    assert_eq!(
        error_kind("::before.a", ParseRelative::No),
        Some(SelectorParseErrorKind::InvalidState)
    );
    // Trailing garbage fails the whole list.
    assert!(SelectorParser::parse_no_namespace("a )").is_err());
    assert!(SelectorParser::parse_no_namespace("a, b {").is_err());
}

#[test]
fn forgiving_is_and_where_drop_invalid_arguments() {
    let list = parse(":is(:unknown, .a)");
    assert_eq!(list.slice()[0].specificity(), packed(0, 1, 0));
    assert!(SelectorParser::parse_no_namespace(":where(::before)").is_ok());
    assert!(SelectorParser::parse_no_namespace(":not(:unknown, .a)").is_err());
}

#[test]
fn nested_has_is_rejected() {
    assert!(SelectorParser::parse_no_namespace(":has(.a)").is_ok());
    assert!(SelectorParser::parse_no_namespace(":has(:has(.a))").is_err());
    assert!(SelectorParser::parse_no_namespace(":has(:not(:has(.a)))").is_err());
    // `:is()` is forgiving, so the nested `:has()` is just dropped.
    assert!(SelectorParser::parse_no_namespace(":has(:is(:has(.a), .b))").is_ok());
}

#[test]
fn nesting_depth_is_bounded() {
    fn nested(depth: usize) -> String {
        format!("{}.a{}", ":not(".repeat(depth), ")".repeat(depth))
    }
    assert!(SelectorParser::parse_no_namespace(&nested(MAX_NESTING_DEPTH)).is_ok());
    assert_eq!(
        error_kind(&nested(MAX_NESTING_DEPTH + 1), ParseRelative::No),
        Some(SelectorParseErrorKind::NestingTooDeep)
    );
}

#[test]
fn nested_rules_may_start_with_a_combinator() {
    assert_eq!(
        error_kind("> .c", ParseRelative::No),
        Some(SelectorParseErrorKind::EmptySelector)
    );
    let namespaces = Namespaces::default();
    let parser = SelectorParser {
        namespaces: &namespaces,
    };
    for input in ["> .c", "+ .c", ".c", "& .c", ".c &"] {
        let list = parser
            .parse(input, ParseRelative::ForNesting)
            .unwrap_or_else(|e| panic!("{:?}: {:?}", input, e));
        assert!(list.slice()[0].has_parent_selector(), "{}", input);
    }
}

/// Specificity of `nested` once `&` is replaced by `parent`.
fn nested_specificity(parent: &str, nested: &str) -> u32 {
    let namespaces = Namespaces::default();
    let parser = SelectorParser {
        namespaces: &namespaces,
    };
    let parent = parser.parse(parent, ParseRelative::No).unwrap();
    let nested = parser.parse(nested, ParseRelative::ForNesting).unwrap();
    let replaced = nested.replace_parent_selector(&parent);
    assert_eq!(replaced.len(), 1);
    assert!(!replaced.slice()[0].has_parent_selector());
    replaced.slice()[0].specificity()
}

#[test]
fn parent_selector_weighs_like_the_parent_written_in_is() {
    assert_eq!(nested_specificity("#p", "& .c"), packed(1, 1, 0));
    assert_eq!(nested_specificity("#p", ".c"), specificity("#p .c"));
    assert_eq!(nested_specificity("#p, .q", "& .c"), packed(1, 1, 0));
    assert_eq!(nested_specificity(".q", ":where(&) .c"), packed(0, 1, 0));
}

#[test]
fn parent_selector_among_alternatives_of_different_shapes() {
    // The parent outweighs a longer but less specific alternative.
    assert_eq!(nested_specificity("#p", ":is(.a .b, &) .c"), packed(1, 1, 0));
    assert_eq!(
        nested_specificity("#p", ":is(.a .b, &) .c"),
        specificity(":is(.a .b, #p) .c")
    );
    assert_eq!(nested_specificity("#p", ":not(.a.b, &)"), specificity(":not(.a.b, #p)"));
    assert_eq!(nested_specificity("#p", ":not(.a.b, &)"), packed(1, 0, 0));
    assert_eq!(
        nested_specificity("#p", ":nth-child(2n of .a.b, &)"),
        specificity(":nth-child(2n of .a.b, #p)")
    );
    assert_eq!(nested_specificity("#p", ":nth-child(2n of .a.b, &)"), packed(1, 1, 0));

    // And the other way round: a weak parent leaves the strongest one in charge.
    assert_eq!(nested_specificity("span", ":is(#a.b, &) i"), packed(1, 1, 1));
    assert_eq!(nested_specificity("span", ":not(&, .x.y.z)"), packed(0, 3, 0));
    assert_eq!(
        nested_specificity("span", ":nth-child(odd of &, div.x)"),
        specificity(":nth-child(odd of span, div.x)")
    );
    assert_eq!(nested_specificity("span", ":nth-child(odd of &, div.x)"), packed(0, 2, 1));
}

#[test]
fn namespace_prefixes_must_be_declared() {
    let mut namespaces = Namespaces::default();
    namespaces
        .prefixes
        .insert("svg".into(), style::atoms::SVG_NAMESPACE.into());
    let parser = SelectorParser {
        namespaces: &namespaces,
    };
    assert!(parser.parse("svg|rect, *|rect, |rect", ParseRelative::No).is_ok());
    assert!(parser.parse("math|mi", ParseRelative::No).is_err());
    assert!(parser.parse("[svg|href]", ParseRelative::No).is_ok());
}
