/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! What the matcher needs to know about a document. Any DOM can be matched
//! against once it implements `Element`.

use crate::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use crate::context::MatchingContext;
use crate::parser::{namespace_empty_string, SelectorImpl};
use std::fmt::Debug;
use std::ptr::NonNull;

/// An element's address, usable only to tell elements apart. `:scope` is
/// stored this way.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OpaqueElement(NonNull<()>);

// Never dereferenced.
unsafe impl Send for OpaqueElement {}
unsafe impl Sync for OpaqueElement {}

impl OpaqueElement {
    /// The identity of whatever `ptr` points at.
    pub fn new<T>(ptr: &T) -> Self {
        OpaqueElement(NonNull::from(ptr).cast())
    }
}

pub trait Element: Sized + Clone + Debug {
    type Impl: SelectorImpl;

    /// Equal for two handles to the same element, and only then.
    fn opaque(&self) -> OpaqueElement;

    fn parent_element(&self) -> Option<Self>;

    /// The element a pseudo-element hangs off of, as in `div` for
    /// `div::before`.
    fn pseudo_element_originating_element(&self) -> Option<Self>;

    fn first_element_child(&self) -> Option<Self>;

    /// The closest preceding sibling that is an element.
    fn prev_sibling_element(&self) -> Option<Self>;

    /// The closest following sibling that is an element.
    fn next_sibling_element(&self) -> Option<Self>;

    fn is_html_element_in_html_document(&self) -> bool;

    fn has_local_name(&self, local_name: &<Self::Impl as SelectorImpl>::LocalName) -> bool;

    /// `ns` is the default value for the null namespace.
    fn has_namespace(&self, ns: &<Self::Impl as SelectorImpl>::NamespaceUrl) -> bool;

    /// Same local name in the same namespace, for the `*-of-type` counters.
    fn is_same_type(&self, other: &Self) -> bool;

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&<Self::Impl as SelectorImpl>::NamespaceUrl>,
        local_name: &<Self::Impl as SelectorImpl>::LocalName,
        operation: &AttrSelectorOperation<&<Self::Impl as SelectorImpl>::AttrValue>,
    ) -> bool;

    fn has_attr_in_no_namespace(
        &self,
        local_name: &<Self::Impl as SelectorImpl>::LocalName,
    ) -> bool {
        self.attr_matches(
            &NamespaceConstraint::Specific(&namespace_empty_string::<Self::Impl>()),
            local_name,
            &AttrSelectorOperation::Exists,
        )
    }

    /// State and other embedder-defined pseudo-classes, `:lang()` included.
    fn match_non_ts_pseudo_class(
        &self,
        pc: &<Self::Impl as SelectorImpl>::NonTSPseudoClass,
        context: &mut MatchingContext<Self::Impl>,
    ) -> bool;

    fn match_pseudo_element(
        &self,
        pe: &<Self::Impl as SelectorImpl>::PseudoElement,
        context: &mut MatchingContext<Self::Impl>,
    ) -> bool;

    /// Whether this is a hyperlink, visited or not.
    fn is_link(&self) -> bool;

    fn has_id(
        &self,
        id: &<Self::Impl as SelectorImpl>::Identifier,
        case_sensitivity: CaseSensitivity,
    ) -> bool;

    fn has_class(
        &self,
        name: &<Self::Impl as SelectorImpl>::Identifier,
        case_sensitivity: CaseSensitivity,
    ) -> bool;

    /// `:empty`: no element children and no text.
    fn is_empty(&self) -> bool;

    /// `:root`: the document element. A parentless element in a detached
    /// subtree is not a root.
    fn is_root(&self) -> bool;
}
