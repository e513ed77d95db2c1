//! Core types for the mutable XML tree.

use std::fmt;

use crate::{Error, Result};

/// The SVG namespace.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// The XLink namespace (`xlink:href`).
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// The namespace bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// An expanded XML name.
///
/// `namespace` is what identifies the name; `prefix` is only the spelling
/// seen in the source (or requested by the caller) and is used as a hint
/// when the tree is written back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlName {
    /// Namespace URI, `None` for names in no namespace.
    pub namespace: Option<String>,
    /// Preferred prefix.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl XmlName {
    /// A name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            local: local.into(),
        }
    }

    /// A namespaced name, written unprefixed (default namespace) when possible.
    pub fn namespaced(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            prefix: None,
            local: local.into(),
        }
    }

    /// A namespaced name with a preferred prefix.
    pub fn prefixed(
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// Whether this name has the given namespace and local part.
    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

impl fmt::Display for XmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An attribute with its (unescaped) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: XmlName,
    pub value: String,
}

/// A namespace declaration found on an element (`xmlns` / `xmlns:p`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix; `None` for the default namespace.
    pub prefix: Option<String>,
    /// Bound URI; empty string undeclares the default namespace.
    pub uri: String,
}

/// Child content of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data (after unescaping entities).
    Text(String),
    CData(String),
    /// Raw comment content.
    Comment(String),
    /// Raw processing instruction content (`target data`).
    ProcessingInstruction(String),
}

impl XmlNode {
    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// The element, if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// Markup that can appear outside the document element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlMisc {
    /// `<?xml ...?>`, raw content between `<?` and `?>`.
    Declaration(String),
    /// `<!DOCTYPE ...>`, raw content after `DOCTYPE`.
    DocType(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An XML element owning its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: XmlName,
    /// Namespace declarations written on this element.
    pub namespaces: Vec<NamespaceDecl>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: XmlName) -> Self {
        Self {
            name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether the element has the given namespace and local name.
    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.name.matches(namespace, local)
    }

    /// Look up an attribute by namespace and local name.
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.matches(namespace, local))
            .map(|attr| attr.value.as_str())
    }

    /// Look up an attribute in no namespace.
    pub fn get_attribute(&self, local: &str) -> Option<&str> {
        self.attribute(None, local)
    }

    /// Whether an attribute with this namespace and local name exists.
    pub fn has_attribute(&self, namespace: Option<&str>, local: &str) -> bool {
        self.attribute(namespace, local).is_some()
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: XmlName, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.matches(name.namespace.as_deref(), &name.local))
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(XmlAttribute { name, value }),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&mut self, namespace: Option<&str>, local: &str) -> Option<String> {
        let index = self
            .attributes
            .iter()
            .position(|attr| attr.name.matches(namespace, local))?;
        Some(self.attributes.remove(index).value)
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set_attribute(XmlName::local("id"), id);
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Append a child element.
    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Pre-order iterator over this element and all its descendant elements.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First descendant element (excluding `self`) in document order
    /// with the given local name.
    pub fn find_descendant(&self, local: &str) -> Option<&XmlElement> {
        self.descendants().skip(1).find(|el| el.name.local == local)
    }

    /// Visit this element and every descendant element in pre-order.
    pub fn for_each_element_mut(&mut self, visit: &mut dyn FnMut(&mut XmlElement)) {
        visit(self);
        for child in &mut self.children {
            if let XmlNode::Element(el) = child {
                el.for_each_element_mut(visit);
            }
        }
    }
}

/// Pre-order element iterator, see [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Reverse so the first child is popped next
        self.stack.extend(current.elements().collect::<Vec<_>>().into_iter().rev());
        Some(current)
    }
}

/// Address of an element as child indices from the document element.
///
/// The empty path is the document element itself. Indices count all child
/// nodes (text and comments included), so a path stays valid as long as no
/// earlier sibling on the way down is inserted or removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    /// Path of the document element.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the parent element and this node's index in it.
    pub fn split_last(&self) -> Option<(NodePath, usize)> {
        let (last, parent) = self.0.split_last()?;
        Some((NodePath(parent.to_vec()), *last))
    }

    /// Path of the `index`-th child of this node.
    pub fn child(&self, index: usize) -> NodePath {
        let mut path = self.0.clone();
        path.push(index);
        NodePath(path)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("/"))
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Declaration, doctype, comments and PIs before the document element.
    pub prolog: Vec<XmlMisc>,
    /// The document element.
    pub root: XmlElement,
    /// Comments and PIs after the document element.
    pub epilog: Vec<XmlMisc>,
}

impl XmlDocument {
    /// A document consisting of just `root`.
    pub fn new(root: XmlElement) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Path of the first element (pre-order) whose `id` equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodePath> {
        fn search(el: &XmlElement, id: &str, path: &mut Vec<usize>) -> bool {
            if el.id() == Some(id) {
                return true;
            }
            for (index, child) in el.children.iter().enumerate() {
                if let XmlNode::Element(child) = child {
                    path.push(index);
                    if search(child, id, path) {
                        return true;
                    }
                    path.pop();
                }
            }
            false
        }

        let mut path = Vec::new();
        search(&self.root, id, &mut path).then_some(NodePath(path))
    }

    /// The element at `path`.
    pub fn element(&self, path: &NodePath) -> Option<&XmlElement> {
        path.0.iter().try_fold(&self.root, |el, &index| {
            el.children.get(index).and_then(XmlNode::as_element)
        })
    }

    /// The element at `path`, mutably.
    pub fn element_mut(&mut self, path: &NodePath) -> Option<&mut XmlElement> {
        let mut current = &mut self.root;
        for &index in &path.0 {
            current = current
                .children
                .get_mut(index)
                .and_then(XmlNode::as_element_mut)?;
        }
        Some(current)
    }

    /// Append `element` as the last child of the document element.
    /// Returns the path of the new element.
    pub fn append_to_root(&mut self, element: XmlElement) -> NodePath {
        self.root.push_element(element);
        NodePath(vec![self.root.children.len() - 1])
    }

    /// Put `element` in the slot currently occupied by the element at
    /// `path`, returning the element that was there.
    ///
    /// The document element itself cannot be replaced.
    pub fn replace_element(&mut self, path: &NodePath, element: XmlElement) -> Result<XmlElement> {
        let no_such_node = || Error::NoSuchNode {
            path: path.to_string(),
        };
        let (parent_path, index) = path.split_last().ok_or_else(no_such_node)?;
        let parent = self.element_mut(&parent_path).ok_or_else(no_such_node)?;
        match parent.children.get_mut(index) {
            Some(slot) if matches!(slot, XmlNode::Element(_)) => {
                match std::mem::replace(slot, XmlNode::Element(element)) {
                    XmlNode::Element(old) => Ok(old),
                    _ => unreachable!("slot was checked to hold an element"),
                }
            }
            _ => Err(no_such_node()),
        }
    }

}
