/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::dom::{parse, Dom, NodeId, TestElement};
use selectors::matching::{matches_selector, may_match};
use selectors::{AncestorHashes, MatchingContext, QuirksMode};
use style::bloom::StyleBloom;

/// `html > body > (div#main.content > p, aside > p)`
fn document() -> (Dom, [NodeId; 6]) {
    let mut dom = Dom::new();
    let html = dom.append(None, "html", &[]);
    let body = dom.append(Some(html), "body", &[]);
    let main = dom.append(Some(body), "div", &[("id", "main"), ("class", "content wide")]);
    let p = dom.append(Some(main), "p", &[]);
    let aside = dom.append(Some(body), "aside", &[]);
    let note = dom.append(Some(aside), "p", &[]);
    (dom, [html, body, main, p, aside, note])
}

fn hashes(selector: &str) -> AncestorHashes {
    AncestorHashes::new(&parse(selector).slice()[0], QuirksMode::NoQuirks)
}

#[test]
fn push_and_pop_leave_the_filter_empty() {
    crate::init_logging();
    let (dom, [html, body, main, p, ..]) = document();
    let mut bloom = StyleBloom::<TestElement>::new();
    assert!(bloom.is_empty());

    bloom.push(dom.element(html));
    bloom.push(dom.element(body));
    bloom.push(dom.element(main));
    assert_eq!(bloom.matching_depth(), 3);
    assert_eq!(bloom.current_parent(), Some(dom.element(main)));
    assert!(may_match(&hashes(".content p"), bloom.filter()));
    assert!(may_match(&hashes("#main > p"), bloom.filter()));
    assert!(may_match(&hashes("html body p"), bloom.filter()));

    assert_eq!(bloom.pop(), Some(dom.element(main)));
    assert_eq!(bloom.pop(), Some(dom.element(body)));
    assert_eq!(bloom.pop(), Some(dom.element(html)));
    assert_eq!(bloom.pop(), None);
    assert!(bloom.is_empty());
    assert!(bloom.filter().is_zeroed());

    // A rebuild from a leaf pushes all of its ancestors.
    bloom.rebuild(dom.element(p));
    assert_eq!(bloom.matching_depth(), 3);
    bloom.clear();
    assert!(bloom.filter().is_zeroed());
}

#[test]
fn insert_parents_recovering_moves_between_subtrees() {
    crate::init_logging();
    let (dom, [html, body, main, p, aside, note]) = document();
    let mut bloom = StyleBloom::<TestElement>::new();

    // Empty filter: rebuilt from scratch.
    bloom.insert_parents_recovering(dom.element(p), 3);
    assert_eq!(bloom.current_parent(), Some(dom.element(main)));
    assert!(may_match(&hashes("#main p"), bloom.filter()));

    // Same parent: nothing to do.
    bloom.insert_parents_recovering(dom.element(p), 3);
    assert_eq!(bloom.matching_depth(), 3);

    // A cousin: pop back to `body`, then push `aside`.
    bloom.insert_parents_recovering(dom.element(note), 3);
    assert_eq!(bloom.current_parent(), Some(dom.element(aside)));
    assert_eq!(bloom.matching_depth(), 3);
    assert!(!may_match(&hashes("#main p"), bloom.filter()));
    assert!(may_match(&hashes("aside p"), bloom.filter()));

    // Back up the tree.
    bloom.insert_parents_recovering(dom.element(main), 2);
    assert_eq!(bloom.current_parent(), Some(dom.element(body)));
    assert_eq!(bloom.matching_depth(), 2);

    // The root has no parents at all.
    bloom.insert_parents_recovering(dom.element(html), 0);
    assert!(bloom.is_empty());
    assert!(bloom.filter().is_zeroed());
}

#[test]
fn insert_parents_recovering_rebuilds_on_a_wrong_depth() {
    crate::init_logging();
    let (dom, [html, body, main, p, ..]) = document();
    let mut bloom = StyleBloom::<TestElement>::new();
    bloom.push(dom.element(html));
    bloom.push(dom.element(body));

    // `p` is at depth 3, not 5.
    bloom.insert_parents_recovering(dom.element(p), 5);
    assert_eq!(bloom.current_parent(), Some(dom.element(main)));
    assert_eq!(bloom.matching_depth(), 3);
}

#[test]
fn bloom_filter_fast_rejects_missing_ancestors() {
    let (dom, [html, body, _, _, aside, note]) = document();
    let mut bloom = StyleBloom::<TestElement>::new();
    bloom.push(dom.element(html));
    bloom.push(dom.element(body));
    bloom.push(dom.element(aside));

    let note = dom.element(note);
    let mut context = MatchingContext::new(Some(bloom.filter()), QuirksMode::NoQuirks);
    for (text, expected) in [("aside p", true), (".content p", false), ("#main p", false)] {
        let list = parse(text);
        let selector = &list.slice()[0];
        let hashes = AncestorHashes::new(selector, QuirksMode::NoQuirks);
        assert_eq!(
            matches_selector(selector, 0, Some(&hashes), &note, &mut context),
            expected,
            "{}",
            text
        );
    }
}
