/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::dom::{parse, Dom, TestElement};
use cssparser::SourceLocation;
use selectors::{AncestorHashes, MatchingContext, QuirksMode};
use servo_arc::Arc;
use style::atoms::SVG_NAMESPACE;
use style::rule::{Rule, StyleRule};
use style::selector_map::SelectorMap;
use style::selector_parser::PseudoElement;

/// One `Rule` per selector in `selectors`, each pointing to a style rule
/// whose declarations are the selector text, so tests can tell them apart.
fn rules(selectors: &[&str], quirks_mode: QuirksMode) -> Vec<Rule> {
    selectors
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let list = parse(text);
            let selector = list.slice()[0].clone();
            let hashes = AncestorHashes::new(&selector, quirks_mode);
            let location = SourceLocation {
                line: i as u32,
                column: 1,
            };
            let style_rule = Arc::new(StyleRule::new(list, text, location));
            Rule::new(selector, hashes, style_rule, i as u32)
        })
        .collect()
}

fn map_of(selectors: &[&str], quirks_mode: QuirksMode) -> SelectorMap<Rule> {
    let mut map = SelectorMap::new();
    for rule in rules(selectors, quirks_mode) {
        map.insert(rule, quirks_mode);
    }
    map
}

fn matching(map: &SelectorMap<Rule>, element: TestElement, quirks_mode: QuirksMode) -> Vec<String> {
    let mut context = MatchingContext::new(None, quirks_mode);
    let mut collected = Vec::<Arc<StyleRule>>::new();
    map.get_all_matching_rules(element, &mut context, &mut collected);
    collected.iter().map(|rule| rule.declarations.to_string()).collect()
}

fn looked_up(map: &SelectorMap<Rule>, element: TestElement) -> Vec<String> {
    let mut seen = Vec::new();
    map.lookup(element, QuirksMode::NoQuirks, |rule| {
        seen.push(rule.style_rule.declarations.to_string());
        true
    });
    seen
}

#[test]
fn rules_come_out_in_ascending_cascade_order() {
    let mut dom = Dom::new();
    let div = dom.append(None, "div", &[("id", "a"), ("class", "b")]);

    let map = map_of(&["#a", ".b"], QuirksMode::NoQuirks);
    assert_eq!(
        matching(&map, dom.element(div), QuirksMode::NoQuirks),
        vec![".b", "#a"]
    );
}

#[test]
fn equal_specificity_falls_back_to_source_order() {
    let mut dom = Dom::new();
    let div = dom.append(None, "div", &[("id", "i"), ("class", "x y")]);

    let map = map_of(
        &[".y", "div", ".x", "#i", "*", ":is(.x)", "div.x"],
        QuirksMode::NoQuirks,
    );
    assert_eq!(
        matching(&map, dom.element(div), QuirksMode::NoQuirks),
        vec!["*", "div", ".y", ".x", ":is(.x)", "div.x", "#i"]
    );
}

#[test]
fn only_matching_rules_are_collected() {
    let mut dom = Dom::new();
    let body = dom.append(None, "body", &[]);
    let p = dom.append(Some(body), "p", &[("class", "note")]);

    let map = map_of(
        &["body > .note", "div > .note", "p.note.other", "span", "body p"],
        QuirksMode::NoQuirks,
    );
    assert_eq!(
        matching(&map, dom.element(p), QuirksMode::NoQuirks),
        vec!["body p", "body > .note"]
    );
}

#[test]
fn len_counts_selectors_not_buckets() {
    let mut map = map_of(&["DIV", ".a", "#b", "*", ".a.c"], QuirksMode::NoQuirks);
    assert!(!map.is_empty());
    assert_eq!(map.len(), 5);

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);

    let mut dom = Dom::new();
    let div = dom.append(None, "div", &[("class", "a")]);
    assert!(matching(&map, dom.element(div), QuirksMode::NoQuirks).is_empty());
}

#[test]
fn lookup_only_visits_relevant_buckets() {
    let mut dom = Dom::new();
    let plain = dom.append(None, "span", &[]);
    let classy = dom.append(None, "div", &[("class", "a")]);

    let map = map_of(
        &[".a", "div", ":is(.a)", ":is(.a, .b)", ":not(.a)", "#a", "span.b"],
        QuirksMode::NoQuirks,
    );
    assert_eq!(looked_up(&map, dom.element(plain)), vec![":is(.a, .b)", ":not(.a)"]);
    assert_eq!(
        looked_up(&map, dom.element(classy)),
        vec![".a", ":is(.a)", "div", ":is(.a, .b)", ":not(.a)"]
    );
}

#[test]
fn lookup_stops_when_the_callback_says_so() {
    let mut dom = Dom::new();
    let div = dom.append(None, "div", &[("class", "a")]);
    let map = map_of(&[".a", "div", "*"], QuirksMode::NoQuirks);

    let mut visited = 0;
    let finished = map.lookup(dom.element(div), QuirksMode::NoQuirks, |_| {
        visited += 1;
        visited < 2
    });
    assert!(!finished);
    assert_eq!(visited, 2);
}

#[test]
fn non_lowercase_type_selectors_are_found_in_and_out_of_html() {
    let mut dom = Dom::new();
    let html = dom.append(None, "html", &[]);
    let div = dom.append(Some(html), "div", &[]);
    let svg = dom.append_ns(Some(html), SVG_NAMESPACE, "svg", &[]);
    let foreign = dom.append_ns(Some(svg), SVG_NAMESPACE, "foreignObject", &[]);
    let lower = dom.append_ns(Some(svg), SVG_NAMESPACE, "foreignobject", &[]);

    let map = map_of(&["DIV", "foreignObject"], QuirksMode::NoQuirks);
    assert_eq!(matching(&map, dom.element(div), QuirksMode::NoQuirks), vec!["DIV"]);
    assert_eq!(
        matching(&map, dom.element(foreign), QuirksMode::NoQuirks),
        vec!["foreignObject"]
    );
    // Outside of HTML, type selectors are case-sensitive.
    assert!(matching(&map, dom.element(lower), QuirksMode::NoQuirks).is_empty());
}

#[test]
fn quirks_mode_ids_and_classes_are_case_insensitive() {
    let mut dom = Dom::new();
    let div = dom.append(None, "div", &[("id", "bar"), ("class", "foo")]);

    let quirks = map_of(&[".Foo", "#BAR"], QuirksMode::Quirks);
    assert_eq!(
        matching(&quirks, dom.element(div), QuirksMode::Quirks),
        vec![".Foo", "#BAR"]
    );

    let no_quirks = map_of(&[".Foo", "#BAR", ".foo"], QuirksMode::NoQuirks);
    assert_eq!(
        matching(&no_quirks, dom.element(div), QuirksMode::NoQuirks),
        vec![".foo"]
    );
}

#[test]
fn pseudo_element_rules_are_hashed_by_the_originating_element() {
    let mut dom = Dom::new();
    let div = dom.append(None, "div", &[("class", "a")]);
    let before = dom.append_pseudo(div, PseudoElement::Before);

    let map = map_of(&["div.a::before", ".a::after", ".b::before"], QuirksMode::NoQuirks);
    assert_eq!(
        matching(&map, dom.element(before), QuirksMode::NoQuirks),
        vec!["div.a::before"]
    );
    assert_eq!(looked_up(&map, dom.element(before)).len(), 2);
}

#[test]
fn every_selector_is_stored_exactly_once() {
    let map = map_of(
        &["DIV", "foreignObject", "Circle", ".a", "#b", "*", ":is(.c)"],
        QuirksMode::NoQuirks,
    );
    assert_eq!(map.entries().count(), map.len());
    assert_eq!(map.len(), 7);

    // A mixed-case type selector is a single candidate whatever the case of
    // the element asking.
    let mut dom = Dom::new();
    let html = dom.append(None, "html", &[]);
    let div = dom.append(Some(html), "div", &[]);
    let svg = dom.append_ns(Some(html), SVG_NAMESPACE, "svg", &[]);
    let foreign = dom.append_ns(Some(svg), SVG_NAMESPACE, "foreignObject", &[]);
    let lower = dom.append_ns(Some(svg), SVG_NAMESPACE, "foreignobject", &[]);
    let count = |element: TestElement, text: &str| {
        looked_up(&map, element).iter().filter(|seen| *seen == text).count()
    };
    assert_eq!(count(dom.element(div), "DIV"), 1);
    assert_eq!(count(dom.element(foreign), "foreignObject"), 1);
    assert_eq!(count(dom.element(lower), "foreignObject"), 1);
}

#[test]
fn repeated_classes_collect_a_rule_once() {
    let mut dom = Dom::new();
    let twice = dom.append(None, "div", &[("class", "a a")]);
    let map = map_of(&[".a", "div.a"], QuirksMode::NoQuirks);
    assert_eq!(
        matching(&map, dom.element(twice), QuirksMode::NoQuirks),
        vec![".a", "div.a"]
    );
    assert_eq!(looked_up(&map, dom.element(twice)), vec![".a", "div.a"]);
}

#[test]
fn classes_differing_only_in_case_collect_a_rule_once_in_quirks_mode() {
    let mut dom = Dom::new();
    let mixed = dom.append(None, "div", &[("class", "Foo foo")]);

    let quirks = map_of(&[".foo"], QuirksMode::Quirks);
    assert_eq!(
        matching(&quirks, dom.element(mixed), QuirksMode::Quirks),
        vec![".foo"]
    );

    // Outside quirks mode they are two different classes.
    let no_quirks = map_of(&[".foo", ".Foo"], QuirksMode::NoQuirks);
    assert_eq!(
        matching(&no_quirks, dom.element(mixed), QuirksMode::NoQuirks),
        vec![".foo", ".Foo"]
    );
}
