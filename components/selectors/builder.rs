/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Assembles parsed components into the order the matcher wants.
//!
//! The parser pushes components left to right. `build` then stores the
//! compounds right to left, and within each compound puts type and
//! namespace checks first, then ids, then classes, then everything else.
//! So `a:hover.b > .c` becomes `[.c, >, a, .b, :hover]`.

use crate::parser::{Combinator, Component, ParseRelative, Selector, SelectorImpl};
use bitflags::bitflags;
use derive_more::{Add, AddAssign};
use smallvec::SmallVec;

/// Collects one complex selector. Components may only be pushed in parse
/// order, and `build` drains the builder so it can be reused.
#[derive(Debug)]
pub struct SelectorBuilder<Impl: SelectorImpl> {
    /// Everything pushed so far, still in parse order. Sized so typical
    /// selectors never spill before being moved into their `Arc`.
    parsed: SmallVec<[Component<Impl>; 32]>,
    combinators: usize,
}

impl<Impl: SelectorImpl> Default for SelectorBuilder<Impl> {
    fn default() -> Self {
        SelectorBuilder {
            parsed: SmallVec::new(),
            combinators: 0,
        }
    }
}

impl<Impl: SelectorImpl> SelectorBuilder<Impl> {
    #[inline]
    pub fn push_simple_selector(&mut self, component: Component<Impl>) {
        debug_assert!(!component.is_combinator());
        self.parsed.push(component);
    }

    /// Closes the current compound.
    #[inline]
    pub fn push_combinator(&mut self, combinator: Combinator) {
        self.parsed.push(Component::Combinator(combinator));
        self.combinators += 1;
    }

    #[inline]
    pub fn has_combinators(&self) -> bool {
        self.combinators != 0
    }

    /// Drains the builder into a selector, computing its specificity.
    pub fn build(&mut self, parse_relative: ParseRelative) -> Selector<Impl> {
        let computed = specificity_and_flags(self.parsed.iter());
        self.build_with_specificity_and_flags(computed, parse_relative)
    }

    /// Like `build`, but trusts the given specificity and flags.
    pub(crate) fn build_with_specificity_and_flags(
        &mut self,
        mut spec: SpecificityAndFlags,
        parse_relative: ParseRelative,
    ) -> Selector<Impl> {
        // Nested rules without `&` are read as `& <selector>`.
        let implicit_parent = parse_relative == ParseRelative::ForNesting &&
            !spec.has_parent_selector();
        if implicit_parent {
            spec.flags.insert(SelectorFlags::HAS_PARENT);
        }

        let mut components = std::mem::take(&mut self.parsed);
        self.combinators = 0;
        into_match_order(&mut components);
        if implicit_parent {
            components.push(Component::Combinator(Combinator::Descendant));
            components.push(Component::ParentSelector);
        }
        Selector::from_parts(spec, components.into_iter().collect())
    }
}

/// Sorts every compound by `compound_rank` and then flips compound order.
/// Reversing each compound before the whole slice keeps the sorted order
/// (and the authored order among equal ranks) inside each one.
fn into_match_order<Impl: SelectorImpl>(components: &mut [Component<Impl>]) {
    for compound in components.split_mut(|component| component.is_combinator()) {
        compound.sort_by_key(compound_rank);
        compound.reverse();
    }
    components.reverse();
}

fn compound_rank<Impl: SelectorImpl>(component: &Component<Impl>) -> u8 {
    match *component {
        Component::LocalName(..) |
        Component::ExplicitUniversalType |
        Component::ExplicitAnyNamespace |
        Component::ExplicitNoNamespace |
        Component::DefaultNamespace(..) |
        Component::Namespace(..) => 0,
        Component::ID(..) => 1,
        Component::Class(..) => 2,
        _ => 3,
    }
}

bitflags! {
    /// Facts about a selector that would otherwise need a walk over its
    /// components.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct SelectorFlags: u8 {
        const HAS_PSEUDO = 1 << 0;
        const HAS_SLOTTED = 1 << 1;
        const HAS_PART = 1 << 2;
        const HAS_PARENT = 1 << 3;
    }
}

impl SelectorFlags {
    /// The flags an inner selector list may pass on to the selector holding
    /// it. Pseudo-element bits stay behind: `:is(::before)` is meaningless,
    /// so a parent like `::before` substituted for `&` must not turn the
    /// nested selector into a pseudo-element selector.
    pub(crate) fn for_nesting() -> Self {
        Self::HAS_PARENT
    }
}

/// A packed specificity next to the selector's flags.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SpecificityAndFlags {
    /// `id << 20 | class << 10 | element`, each field saturating at 1023.
    pub(crate) specificity: u32,
    pub(crate) flags: SelectorFlags,
}

impl SpecificityAndFlags {
    #[inline]
    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    #[inline]
    pub fn flags(&self) -> SelectorFlags {
        self.flags
    }

    #[inline]
    pub fn has_pseudo_element(&self) -> bool {
        self.flags.contains(SelectorFlags::HAS_PSEUDO)
    }

    #[inline]
    pub fn is_slotted(&self) -> bool {
        self.flags.contains(SelectorFlags::HAS_SLOTTED)
    }

    #[inline]
    pub fn is_part(&self) -> bool {
        self.flags.contains(SelectorFlags::HAS_PART)
    }

    #[inline]
    pub fn has_parent_selector(&self) -> bool {
        self.flags.contains(SelectorFlags::HAS_PARENT)
    }
}

const FIELD_MAX: u32 = 0x3ff;

/// Unpacked specificity. Arithmetic happens here, one counter at a time,
/// and only the final value is packed.
#[derive(Add, AddAssign, Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Specificity {
    pub id_selectors: u32,
    pub class_like_selectors: u32,
    pub element_selectors: u32,
}

impl Specificity {
    pub const fn new(id_selectors: u32, class_like_selectors: u32, element_selectors: u32) -> Self {
        Specificity {
            id_selectors,
            class_like_selectors,
            element_selectors,
        }
    }

    #[inline]
    pub const fn single_class_like() -> Self {
        Specificity::new(0, 1, 0)
    }
}

impl From<u32> for Specificity {
    fn from(packed: u32) -> Self {
        assert!(packed >> 30 == 0, "not a packed specificity: {:#x}", packed);
        Specificity::new(packed >> 20, (packed >> 10) & FIELD_MAX, packed & FIELD_MAX)
    }
}

impl From<Specificity> for u32 {
    fn from(s: Specificity) -> u32 {
        s.id_selectors.min(FIELD_MAX) << 20 |
            s.class_like_selectors.min(FIELD_MAX) << 10 |
            s.element_selectors.min(FIELD_MAX)
    }
}

/// Sums the specificity of `components` and unions their flags. Selector
/// arguments add their most specific alternative, except `:where()`.
pub(crate) fn specificity_and_flags<'a, Impl: SelectorImpl>(
    components: impl Iterator<Item = &'a Component<Impl>>,
) -> SpecificityAndFlags {
    let mut total = Specificity::default();
    let mut flags = SelectorFlags::empty();
    for component in components {
        let (specificity, component_flags) = contribution(component);
        total += specificity;
        flags |= component_flags;
    }
    SpecificityAndFlags {
        specificity: total.into(),
        flags,
    }
}

fn contribution<Impl: SelectorImpl>(component: &Component<Impl>) -> (Specificity, SelectorFlags) {
    const ID: Specificity = Specificity::new(1, 0, 0);
    const CLASS: Specificity = Specificity::single_class_like();
    const ELEMENT: Specificity = Specificity::new(0, 0, 1);
    let none = SelectorFlags::empty();

    let inner = |sf: SpecificityAndFlags| {
        (Specificity::from(sf.specificity), sf.flags & SelectorFlags::for_nesting())
    };

    match *component {
        Component::ID(..) => (ID, none),
        Component::Class(..) |
        Component::AttributeInNoNamespaceExists { .. } |
        Component::AttributeInNoNamespace { .. } |
        Component::AttributeOther(..) |
        Component::NonTSPseudoClass(..) |
        Component::Root |
        Component::Empty |
        Component::Scope |
        Component::Nth(..) => (CLASS, none),
        Component::LocalName(..) => (ELEMENT, none),
        Component::PseudoElement(..) => (ELEMENT, SelectorFlags::HAS_PSEUDO),
        Component::Part(..) => (ELEMENT, SelectorFlags::HAS_PART),
        Component::Slotted(ref selector) => {
            let (specificity, flags) = inner(selector.specificity_and_flags());
            (ELEMENT + specificity, SelectorFlags::HAS_SLOTTED | flags)
        },
        Component::Host(None) => (CLASS, none),
        Component::Host(Some(ref selector)) => {
            let (specificity, flags) = inner(selector.specificity_and_flags());
            (CLASS + specificity, flags)
        },
        Component::NthOf(ref nth_of) => {
            let (specificity, flags) = inner(selector_list_specificity_and_flags(
                nth_of.selectors().iter(),
            ));
            (CLASS + specificity, flags)
        },
        Component::Is(ref list) | Component::Negation(ref list) => {
            inner(selector_list_specificity_and_flags(list.slice().iter()))
        },
        Component::Where(ref list) => {
            let (_, flags) = inner(selector_list_specificity_and_flags(list.slice().iter()));
            (Specificity::default(), flags)
        },
        Component::Has(ref relative) => inner(selector_list_specificity_and_flags(
            relative.iter().map(|relative| &relative.selector),
        )),
        Component::ParentSelector => (Specificity::default(), SelectorFlags::HAS_PARENT),
        Component::ExplicitUniversalType |
        Component::ExplicitAnyNamespace |
        Component::ExplicitNoNamespace |
        Component::DefaultNamespace(..) |
        Component::Namespace(..) |
        Component::RelativeSelectorAnchor |
        Component::Combinator(..) => (Specificity::default(), none),
    }
}

/// The most specific alternative's specificity, and every alternative's flags.
pub(crate) fn selector_list_specificity_and_flags<'a, Impl: SelectorImpl>(
    selectors: impl Iterator<Item = &'a Selector<Impl>>,
) -> SpecificityAndFlags {
    selectors.fold(SpecificityAndFlags::default(), |acc, selector| SpecificityAndFlags {
        specificity: acc.specificity.max(selector.specificity()),
        flags: acc.flags | selector.flags(),
    })
}
