/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Right-to-left matching of parsed selectors against an `Element`.

use crate::attr::{AttrSelectorOperation, NamespaceConstraint, ParsedAttrSelectorOperation};
use crate::bloom::{BloomFilter, BLOOM_HASH_MASK};
use crate::context::{MatchingContext, QuirksMode, VisitedHandlingMode};
use crate::parser::{namespace_empty_string, AncestorHashes, Combinator, Component};
use crate::parser::{NthSelectorData, RelativeSelector, Selector, SelectorImpl};
use crate::parser::{SelectorIter, SelectorList};
use crate::tree::Element;
use log::debug;

type NamespaceUrl<E> = <<E as Element>::Impl as SelectorImpl>::NamespaceUrl;

/// How a compound (and everything to its left) failed, which decides how
/// far the caller has to back off before trying another element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Verdict {
    Matched,
    /// Another earlier sibling may still work for the nearest `~` to the right.
    RetrySibling,
    /// Siblings are exhausted, but a higher ancestor may still work for the
    /// nearest descendant combinator to the right.
    RetryAncestor,
    /// No other candidate can help, so the whole selector fails.
    Hopeless,
}

/// Whether any selector of the list matches `element`.
pub fn matches_selector_list<E>(
    list: &SelectorList<E::Impl>,
    element: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool
where
    E: Element,
{
    matches_any(list.slice(), element, context)
}

/// Returns false only when the bloom filter proves that some ancestor the
/// selector needs is missing.
#[inline]
pub fn may_match(hashes: &AncestorHashes, bf: &BloomFilter) -> bool {
    // A zero slot ends the list, and the fourth hash lives in the spare high
    // bytes of the first three.
    let fourth = hashes.fourth_hash();
    hashes
        .packed_hashes
        .iter()
        .map(|packed| packed & BLOOM_HASH_MASK)
        .chain(std::iter::once(fourth))
        .take_while(|hash| *hash != 0)
        .all(|hash| bf.might_contain_hash(hash))
}

/// Matches `selector` starting `offset` components from the right, first
/// consulting the bloom filter when both hashes and a filter are present.
#[inline]
pub fn matches_selector<E>(
    selector: &Selector<E::Impl>,
    offset: usize,
    hashes: Option<&AncestorHashes>,
    element: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool
where
    E: Element,
{
    let rejected = match (hashes, context.bloom_filter) {
        (Some(hashes), Some(filter)) => !may_match(hashes, filter),
        _ => false,
    };
    !rejected && matches_complex(selector.iter_from(offset), element, context)
}

/// Whether `element` matches `selector` with a fresh context and no bloom
/// filter. Mostly useful for one-off checks like `Element.matches()`.
pub fn element_matches<E>(selector: &Selector<E::Impl>, element: &E, quirks_mode: QuirksMode) -> bool
where
    E: Element,
{
    let mut context = MatchingContext::new(None, quirks_mode);
    matches_selector(selector, 0, None, element, &mut context)
}

/// Picks the lowercase spelling of a name for HTML elements in HTML
/// documents, and the authored one otherwise.
#[inline(always)]
pub fn select_name<'a, E: Element, T: PartialEq>(
    element: &E,
    local_name: &'a T,
    local_name_lower: &'a T,
) -> &'a T {
    if local_name == local_name_lower || element.is_html_element_in_html_document() {
        local_name_lower
    } else {
        local_name
    }
}

fn matches_any<E: Element>(
    selectors: &[Selector<E::Impl>],
    element: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool {
    selectors
        .iter()
        .any(|selector| matches_complex(selector.iter(), element, context))
}

fn matches_complex<E: Element>(
    iter: SelectorIter<E::Impl>,
    element: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool {
    walk_compounds(iter, element, context) == Verdict::Matched
}

/// Where the search continues after a combinator: siblings walk backwards,
/// descendants walk up. Shadow trees are not modelled, so `::part` and
/// `::slotted` have nowhere to go.
fn step<E: Element>(element: &E, combinator: Combinator) -> Option<E> {
    match combinator {
        Combinator::NextSibling | Combinator::LaterSibling => element.prev_sibling_element(),
        Combinator::Child | Combinator::Descendant => element.parent_element(),
        Combinator::PseudoElement => element.pseudo_element_originating_element(),
        Combinator::Part | Combinator::SlotAssignment => None,
    }
}

fn walk_compounds<E: Element>(
    mut iter: SelectorIter<E::Impl>,
    element: &E,
    context: &mut MatchingContext<E::Impl>,
) -> Verdict {
    debug!("Matching {:?} against {:?}", iter, element);

    let compound_matched = iter.all(|component| matches_component(component, element, context));
    if !compound_matched {
        return Verdict::RetrySibling;
    }
    let combinator = match iter.next_sequence() {
        Some(combinator) => combinator,
        None => return Verdict::Matched,
    };

    // Siblings and anything past a link are always matched as unvisited.
    let mut visited = if combinator.is_sibling() {
        VisitedHandlingMode::AllLinksUnvisited
    } else {
        context.visited_handling()
    };

    let mut candidate = element.clone();
    loop {
        if candidate.is_link() {
            visited = VisitedHandlingMode::AllLinksUnvisited;
        }
        candidate = match step(&candidate, combinator) {
            Some(next) => next,
            None if combinator.is_sibling() => return Verdict::RetryAncestor,
            None => return Verdict::Hopeless,
        };

        let verdict = context.with_visited_handling_mode(visited, |context| {
            walk_compounds(iter.clone(), &candidate, context)
        });
        match (verdict, combinator) {
            (Verdict::Matched, _) | (Verdict::Hopeless, _) => return verdict,
            // Only one candidate exists for these.
            (_, Combinator::NextSibling) => return verdict,
            (_, Combinator::Child) | (_, Combinator::PseudoElement) => {
                return Verdict::RetryAncestor
            },
            // Earlier siblings can't fix a failure that needs a new ancestor.
            (Verdict::RetryAncestor, Combinator::LaterSibling) => return verdict,
            _ => continue,
        }
    }
}

fn matches_attribute<E: Element>(
    element: &E,
    namespace: Option<&NamespaceConstraint<&NamespaceUrl<E>>>,
    local_name: &<E::Impl as SelectorImpl>::LocalName,
    operation: &AttrSelectorOperation<&<E::Impl as SelectorImpl>::AttrValue>,
) -> bool {
    match namespace {
        Some(namespace) => element.attr_matches(namespace, local_name, operation),
        None => {
            let empty = namespace_empty_string::<E::Impl>();
            element.attr_matches(&NamespaceConstraint::Specific(&empty), local_name, operation)
        },
    }
}

fn matches_component<E: Element>(
    component: &Component<E::Impl>,
    element: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool {
    debug_assert!(context.is_nested() || !context.in_negation());
    match *component {
        Component::LocalName(ref name) => {
            element.has_local_name(select_name(element, &name.name, &name.lower_name))
        },
        Component::ID(ref id) => element.has_id(id, context.classes_and_ids_case_sensitivity()),
        Component::Class(ref class) => {
            element.has_class(class, context.classes_and_ids_case_sensitivity())
        },
        Component::ExplicitUniversalType | Component::ExplicitAnyNamespace => true,
        Component::ExplicitNoNamespace => {
            element.has_namespace(&namespace_empty_string::<E::Impl>())
        },
        Component::DefaultNamespace(ref url) | Component::Namespace(_, ref url) => {
            element.has_namespace(url)
        },
        Component::AttributeInNoNamespaceExists {
            ref local_name,
            ref local_name_lower,
        } => matches_attribute(
            element,
            None,
            select_name(element, local_name, local_name_lower),
            &AttrSelectorOperation::Exists,
        ),
        Component::AttributeInNoNamespace {
            ref local_name,
            operator,
            ref value,
            case_sensitivity,
            never_matches,
        } => {
            !never_matches &&
                matches_attribute(
                    element,
                    None,
                    local_name,
                    &AttrSelectorOperation::WithValue {
                        operator,
                        case_sensitivity: case_sensitivity.to_unconditional(),
                        value,
                    },
                )
        },
        Component::AttributeOther(ref attr) => {
            if attr.never_matches {
                return false;
            }
            let operation = match attr.operation {
                ParsedAttrSelectorOperation::Exists => AttrSelectorOperation::Exists,
                ParsedAttrSelectorOperation::WithValue {
                    operator,
                    case_sensitivity,
                    ref value,
                } => AttrSelectorOperation::WithValue {
                    operator,
                    case_sensitivity: case_sensitivity.to_unconditional(),
                    value,
                },
            };
            matches_attribute(
                element,
                attr.namespace().as_ref(),
                select_name(element, &attr.local_name, &attr.local_name_lower),
                &operation,
            )
        },
        Component::NonTSPseudoClass(ref pc) => element.match_non_ts_pseudo_class(pc, context),
        Component::PseudoElement(ref pe) => element.match_pseudo_element(pe, context),
        Component::Root => element.is_root(),
        Component::Empty => element.is_empty(),
        // An unresolved `&` behaves like `:scope`.
        Component::ParentSelector | Component::Scope => match context.scope_element {
            Some(scope) => element.opaque() == scope,
            None => element.is_root(),
        },
        Component::Nth(ref nth) => matches_nth(element, context, nth, &[]),
        Component::NthOf(ref nth_of) => context.nest(|context| {
            matches_nth(element, context, nth_of.nth_data(), nth_of.selectors())
        }),
        Component::Is(ref list) | Component::Where(ref list) => {
            context.nest(|context| matches_any(list.slice(), element, context))
        },
        Component::Negation(ref list) => {
            context.nest_for_negation(|context| !matches_any(list.slice(), element, context))
        },
        Component::Has(ref relative) => matches_has(relative, element, context),
        Component::RelativeSelectorAnchor => context
            .relative_selector_anchor()
            .map_or(true, |anchor| anchor == element.opaque()),
        Component::Part(..) | Component::Slotted(..) | Component::Host(..) => false,
        // `SelectorIter` stops at every combinator.
        Component::Combinator(_) => false,
    }
}

fn matches_has<E: Element>(
    relative: &[RelativeSelector<E::Impl>],
    anchor: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool {
    // `:has()` can't nest, though `&` replacement may still smuggle one in.
    if context.relative_selector_anchor().is_some() {
        return false;
    }
    context.nest_for_relative_selector(anchor.opaque(), |context| {
        relative
            .iter()
            .any(|relative| matches_relative(relative, anchor, context))
    })
}

/// Visits only the elements the relative selector's leading combinator and
/// its match hint allow it to land on.
fn matches_relative<E: Element>(
    relative: &RelativeSelector<E::Impl>,
    anchor: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool {
    let hint = relative.match_hint;
    let selector = &relative.selector;
    let descend = hint.is_descendant_direction();

    let mut candidate = if descend {
        anchor.first_element_child()
    } else {
        anchor.next_sibling_element()
    };
    while let Some(element) = candidate {
        // Sibling-subtree hints only ever match below the sibling itself.
        let at_element = descend || !hint.is_subtree();
        if at_element && matches_complex(selector.iter(), &element, context) {
            return true;
        }
        if hint.is_subtree() && matches_in_subtree(selector, &element, context) {
            return true;
        }
        if !descend && hint.is_next_sibling() {
            return false;
        }
        candidate = element.next_sibling_element();
    }
    false
}

fn matches_in_subtree<E: Element>(
    selector: &Selector<E::Impl>,
    root: &E,
    context: &mut MatchingContext<E::Impl>,
) -> bool {
    let mut child = root.first_element_child();
    while let Some(element) = child {
        if matches_complex(selector.iter(), &element, context) ||
            matches_in_subtree(selector, &element, context)
        {
            return true;
        }
        child = element.next_sibling_element();
    }
    false
}

fn matches_nth<E: Element>(
    element: &E,
    context: &mut MatchingContext<E::Impl>,
    nth: &NthSelectorData,
    of: &[Selector<E::Impl>],
) -> bool {
    if !of.is_empty() && !matches_any(of, element, context) {
        return false;
    }

    let of_type = nth.ty.is_of_type();
    if nth.ty.is_only() {
        debug_assert!(of.is_empty(), "only-child never carries a selector list");
        return [NthSelectorData::first(of_type), NthSelectorData::last(of_type)]
            .iter()
            .all(|edge| matches_nth(element, context, edge, of));
    }

    let from_end = nth.ty.is_from_end();
    let neighbour = |e: &E| {
        if from_end {
            e.next_sibling_element()
        } else {
            e.prev_sibling_element()
        }
    };
    if nth.is_simple_edge() && of.is_empty() {
        return neighbour(element).is_none();
    }

    let mut index = 1;
    let mut current = neighbour(element);
    while let Some(sibling) = current {
        let counts = if of_type {
            element.is_same_type(&sibling)
        } else {
            of.is_empty() || matches_any(of, &sibling, context)
        };
        if counts {
            index += 1;
        }
        current = neighbour(&sibling);
    }

    solves_an_plus_b(nth.a, nth.b, index)
}

/// Whether some `n >= 0` gives `a*n + b == index`.
fn solves_an_plus_b(a: i32, b: i32, index: i32) -> bool {
    let Some(diff) = index.checked_sub(b) else {
        return false;
    };
    if a == 0 {
        return diff == 0;
    }
    diff % a == 0 && diff / a >= 0
}
