/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A small arena-backed document to match selectors against.

use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::matches_selector_list;
use selectors::{Element, MatchingContext, OpaqueElement, QuirksMode, SelectorList};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;
use style::atoms::HTML_NAMESPACE;
use style::dom::{ElementState, TElement};
use style::selector_parser::{NonTSPseudoClass, PseudoElement, SelectorImpl, SelectorParser};
use style::{Atom, LocalName, Namespace};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(usize);

struct ElementData {
    local_name: LocalName,
    namespace: Namespace,
    id: Option<Atom>,
    classes: Vec<Atom>,
    attrs: Vec<(LocalName, String)>,
    state: ElementState,
    pseudo: Option<PseudoElement>,
}

enum NodeData {
    Element(ElementData),
    Text(String),
}

struct Node {
    data: NodeData,
    parent: Option<usize>,
    children: Vec<usize>,
    originating: Option<usize>,
}

impl Node {
    fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(..))
    }
}

pub struct Dom {
    nodes: Vec<Node>,
    is_html_document: bool,
}

impl Dom {
    pub fn new() -> Self {
        Dom {
            nodes: Vec::new(),
            is_html_document: true,
        }
    }

    /// Appends an HTML element. `id` and `class` attributes also set the id
    /// and classes of the element.
    pub fn append(&mut self, parent: Option<NodeId>, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.append_ns(parent, HTML_NAMESPACE, name, attrs)
    }

    pub fn append_ns(
        &mut self,
        parent: Option<NodeId>,
        namespace: &str,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> NodeId {
        let mut data = ElementData {
            local_name: LocalName::from(name),
            namespace: Namespace::from(namespace),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            state: ElementState::empty(),
            pseudo: None,
        };
        for &(attr, value) in attrs {
            match attr {
                "id" => data.id = Some(Atom::from(value)),
                "class" => data.classes = value.split_whitespace().map(Atom::from).collect(),
                _ => {},
            }
            data.attrs.push((LocalName::from(attr), value.to_owned()));
        }
        self.push(NodeData::Element(data), parent.map(|p| p.0), None)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        self.push(NodeData::Text(text.to_owned()), Some(parent.0), None);
    }

    /// Creates a pseudo-element hanging off `originating`. It isn't one of
    /// its children.
    pub fn append_pseudo(&mut self, originating: NodeId, pseudo: PseudoElement) -> NodeId {
        let data = ElementData {
            local_name: LocalName::default(),
            namespace: Namespace::from(HTML_NAMESPACE),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            state: ElementState::empty(),
            pseudo: Some(pseudo),
        };
        self.push(NodeData::Element(data), None, Some(originating.0))
    }

    pub fn set_state(&mut self, node: NodeId, state: ElementState) {
        match self.nodes[node.0].data {
            NodeData::Element(ref mut data) => data.state = state,
            NodeData::Text(..) => panic!("Text nodes have no state"),
        }
    }

    pub fn element(&self, node: NodeId) -> TestElement {
        assert!(self.nodes[node.0].is_element());
        TestElement {
            dom: self,
            index: node.0,
        }
    }

    fn push(&mut self, data: NodeData, parent: Option<usize>, originating: Option<usize>) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
            originating,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(index);
        }
        NodeId(index)
    }
}

#[derive(Clone, Copy)]
pub struct TestElement<'a> {
    dom: &'a Dom,
    index: usize,
}

impl<'a> TestElement<'a> {
    fn node(&self) -> &'a Node {
        &self.dom.nodes[self.index]
    }

    fn data(&self) -> &'a ElementData {
        match self.node().data {
            NodeData::Element(ref data) => data,
            NodeData::Text(..) => unreachable!("TestElement always points at an element"),
        }
    }

    fn with_index(&self, index: usize) -> Self {
        TestElement {
            dom: self.dom,
            index,
        }
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.data()
            .attrs
            .iter()
            .find(|(attr, _)| &***attr == name)
            .map(|(_, value)| value.as_str())
    }

    fn sibling_element(&self, forward: bool) -> Option<Self> {
        let siblings = &self.dom.nodes[self.node().parent?].children;
        let position = siblings.iter().position(|&child| child == self.index)?;
        let is_element = |index: &&usize| self.dom.nodes[**index].is_element();
        let found = if forward {
            siblings[position + 1..].iter().find(is_element)
        } else {
            siblings[..position].iter().rev().find(is_element)
        };
        found.map(|&index| self.with_index(index))
    }
}

impl<'a> PartialEq for TestElement<'a> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.dom, other.dom) && self.index == other.index
    }
}

impl<'a> Eq for TestElement<'a> {}

impl<'a> Hash for TestElement<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state)
    }
}

impl<'a> fmt::Debug for TestElement<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let data = self.data();
        if let Some(ref pseudo) = data.pseudo {
            return write!(f, "<{:?}>", pseudo);
        }
        write!(f, "<{}", data.local_name)?;
        if let Some(ref id) = data.id {
            write!(f, "#{}", id)?;
        }
        for class in &data.classes {
            write!(f, ".{}", class)?;
        }
        write!(f, "> ({})", self.index)
    }
}

impl<'a> Element for TestElement<'a> {
    type Impl = SelectorImpl;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.node())
    }

    fn parent_element(&self) -> Option<Self> {
        self.node().parent.map(|index| self.with_index(index))
    }

    fn pseudo_element_originating_element(&self) -> Option<Self> {
        self.node().originating.map(|index| self.with_index(index))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.node()
            .children
            .iter()
            .find(|&&child| self.dom.nodes[child].is_element())
            .map(|&child| self.with_index(child))
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element(false)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(true)
    }

    fn is_html_element_in_html_document(&self) -> bool {
        self.dom.is_html_document && &**self.data().namespace == HTML_NAMESPACE
    }

    fn has_local_name(&self, local_name: &LocalName) -> bool {
        self.data().local_name == *local_name
    }

    fn has_namespace(&self, ns: &Namespace) -> bool {
        self.data().namespace == *ns
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data().local_name == other.data().local_name &&
            self.data().namespace == other.data().namespace
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&Namespace>,
        local_name: &LocalName,
        operation: &AttrSelectorOperation<&Atom>,
    ) -> bool {
        // Attributes here never have a namespace.
        let namespace_matches = match *ns {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Specific(url) => url.is_empty(),
        };
        namespace_matches &&
            self.data()
                .attrs
                .iter()
                .any(|(name, value)| name == local_name && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        context: &mut MatchingContext<SelectorImpl>,
    ) -> bool {
        style::dom::match_non_ts_pseudo_class(self, pc, context)
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<SelectorImpl>,
    ) -> bool {
        self.data().pseudo.as_ref() == Some(pe)
    }

    fn is_link(&self) -> bool {
        self.is_html_element_in_html_document() &&
            matches!(&**self.data().local_name, "a" | "area" | "link") &&
            self.attr("href").is_some()
    }

    fn has_id(&self, id: &Atom, case_sensitivity: CaseSensitivity) -> bool {
        self.data()
            .id
            .as_ref()
            .map_or(false, |own| case_sensitivity.eq(own.as_bytes(), id.as_bytes()))
    }

    fn has_class(&self, name: &Atom, case_sensitivity: CaseSensitivity) -> bool {
        self.data()
            .classes
            .iter()
            .any(|class| case_sensitivity.eq(class.as_bytes(), name.as_bytes()))
    }

    fn is_empty(&self) -> bool {
        self.node()
            .children
            .iter()
            .all(|&child| match self.dom.nodes[child].data {
                NodeData::Element(..) => false,
                NodeData::Text(ref text) => text.is_empty(),
            })
    }

    fn is_root(&self) -> bool {
        self.node().parent.is_none() && self.node().originating.is_none()
    }
}

impl<'a> TElement for TestElement<'a> {
    fn local_name(&self) -> &LocalName {
        &self.data().local_name
    }

    fn namespace(&self) -> &Namespace {
        &self.data().namespace
    }

    fn id(&self) -> Option<&Atom> {
        self.data().id.as_ref()
    }

    fn each_class<F>(&self, mut callback: F)
    where
        F: FnMut(&Atom),
    {
        for class in &self.data().classes {
            callback(class);
        }
    }

    fn state(&self) -> ElementState {
        self.data().state
    }

    fn match_element_lang(&self, value: &str) -> bool {
        let mut current = Some(*self);
        while let Some(element) = current {
            if let Some(lang) = element.attr("lang") {
                return lang.eq_ignore_ascii_case(value) ||
                    (lang.as_bytes().get(value.len()) == Some(&b'-') &&
                        lang.get(..value.len())
                            .map_or(false, |prefix| prefix.eq_ignore_ascii_case(value)));
            }
            current = element.parent_element();
        }
        false
    }
}

pub fn parse(input: &str) -> SelectorList<SelectorImpl> {
    SelectorParser::parse_no_namespace(input)
        .unwrap_or_else(|e| panic!("Failed to parse {:?}: {:?}", input, e))
}

pub fn matches_in(quirks_mode: QuirksMode, input: &str, element: TestElement) -> bool {
    let list = parse(input);
    let mut context = MatchingContext::new(None, quirks_mode);
    matches_selector_list(&list, &element, &mut context)
}

pub fn matches(input: &str, element: TestElement) -> bool {
    matches_in(QuirksMode::NoQuirks, input, element)
}
