//! Serialization of [`XmlDocument`] trees back to text.
//!
//! Elements and attributes are written with the prefixes recorded on their
//! names whenever those prefixes are bound to the right namespace. Names
//! whose namespace is not in scope get a declaration added on the element
//! that needs it, so a tree edited in memory always serializes to
//! namespace-well-formed XML.

use quick_xml::escape::{escape, partial_escape};

use crate::types::XML_NS;
use crate::{NamespaceDecl, XmlDocument, XmlElement, XmlMisc, XmlName, XmlNode};

impl XmlDocument {
    /// Serialize the whole document, prolog and epilog included.
    ///
    /// # Example
    ///
    /// ```rust
    /// use textext_xml::parse;
    ///
    /// let source = r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="a"/></svg>"#;
    /// let doc = parse(source).unwrap();
    /// assert_eq!(doc.to_xml_string(), format!("{}\n", source));
    /// ```
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        for misc in &self.prolog {
            write_misc(&mut out, misc);
            out.push('\n');
        }
        write_element(&mut out, &self.root, &mut Scope::new());
        out.push('\n');
        for misc in &self.epilog {
            write_misc(&mut out, misc);
            out.push('\n');
        }
        out
    }
}

impl XmlElement {
    /// Serialize this element as a standalone fragment.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self, &mut Scope::new());
        out
    }
}

/// Namespace bindings in effect while writing.
struct Scope {
    bindings: Vec<NamespaceDecl>,
}

impl Scope {
    fn new() -> Self {
        Self {
            bindings: vec![NamespaceDecl {
                prefix: Some("xml".to_string()),
                uri: XML_NS.to_string(),
            }],
        }
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|decl| decl.prefix.as_deref() == prefix)
            .map(|decl| decl.uri.as_str())
    }

    fn default_namespace(&self) -> &str {
        self.lookup(None).unwrap_or("")
    }

    /// Innermost prefix currently bound to `uri` and not shadowed.
    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings.iter().rev().find_map(|decl| {
            let prefix = decl.prefix.as_deref()?;
            (decl.uri == uri && self.lookup(Some(prefix)) == Some(uri)).then_some(prefix)
        })
    }

    fn declare(&mut self, decl: NamespaceDecl, added: &mut Vec<NamespaceDecl>) {
        self.bindings.push(decl.clone());
        added.push(decl);
    }

    /// A prefix not bound to anything in scope.
    fn fresh_prefix(&self) -> String {
        (0..)
            .map(|n| format!("ns{}", n))
            .find(|candidate| self.lookup(Some(candidate)).is_none())
            .unwrap_or_default()
    }

    /// The qualified name to write for an element, declaring its namespace
    /// in `added` when needed.
    fn element_qname(&mut self, name: &XmlName, added: &mut Vec<NamespaceDecl>) -> String {
        let Some(uri) = name.namespace.as_deref() else {
            if !self.default_namespace().is_empty() {
                self.declare(
                    NamespaceDecl {
                        prefix: None,
                        uri: String::new(),
                    },
                    added,
                );
            }
            return name.local.clone();
        };

        if let Some(hint) = name.prefix.as_deref() {
            if self.lookup(Some(hint)) == Some(uri) {
                return format!("{}:{}", hint, name.local);
            }
        }
        if self.default_namespace() == uri {
            return name.local.clone();
        }
        if let Some(prefix) = self.prefix_for(uri) {
            return format!("{}:{}", prefix, name.local);
        }

        match name.prefix.as_deref() {
            Some(hint) if self.lookup(Some(hint)).is_none() => {
                self.declare(
                    NamespaceDecl {
                        prefix: Some(hint.to_string()),
                        uri: uri.to_string(),
                    },
                    added,
                );
                format!("{}:{}", hint, name.local)
            }
            _ => {
                self.declare(
                    NamespaceDecl {
                        prefix: None,
                        uri: uri.to_string(),
                    },
                    added,
                );
                name.local.clone()
            }
        }
    }

    /// The qualified name to write for an attribute. Namespaced attributes
    /// always need a prefix.
    fn attribute_qname(&mut self, name: &XmlName, added: &mut Vec<NamespaceDecl>) -> String {
        let Some(uri) = name.namespace.as_deref() else {
            return name.local.clone();
        };

        if let Some(hint) = name.prefix.as_deref() {
            if self.lookup(Some(hint)) == Some(uri) {
                return format!("{}:{}", hint, name.local);
            }
        }
        if let Some(prefix) = self.prefix_for(uri) {
            return format!("{}:{}", prefix, name.local);
        }

        let prefix = match name.prefix.as_deref() {
            Some(hint) if self.lookup(Some(hint)).is_none() => hint.to_string(),
            _ => self.fresh_prefix(),
        };
        self.declare(
            NamespaceDecl {
                prefix: Some(prefix.clone()),
                uri: uri.to_string(),
            },
            added,
        );
        format!("{}:{}", prefix, name.local)
    }
}

fn write_misc(out: &mut String, misc: &XmlMisc) {
    match misc {
        XmlMisc::Declaration(content) | XmlMisc::ProcessingInstruction(content) => {
            out.push_str("<?");
            out.push_str(content);
            out.push_str("?>");
        }
        XmlMisc::DocType(content) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(content.trim_start());
            out.push('>');
        }
        XmlMisc::Comment(content) => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
    }
}

fn write_element(out: &mut String, element: &XmlElement, scope: &mut Scope) {
    let mark = scope.bindings.len();
    scope.bindings.extend(element.namespaces.iter().cloned());

    let mut added = Vec::new();
    let qname = scope.element_qname(&element.name, &mut added);
    let attributes: Vec<(String, &str)> = element
        .attributes
        .iter()
        .map(|attr| (scope.attribute_qname(&attr.name, &mut added), attr.value.as_str()))
        .collect();

    out.push('<');
    out.push_str(&qname);
    for decl in element.namespaces.iter().chain(added.iter()) {
        match &decl.prefix {
            Some(prefix) => write_attribute(out, &format!("xmlns:{}", prefix), &decl.uri),
            None => write_attribute(out, "xmlns", &decl.uri),
        }
    }
    for (name, value) in &attributes {
        write_attribute(out, name, value);
    }

    if element.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        for child in &element.children {
            match child {
                XmlNode::Element(el) => write_element(out, el, scope),
                XmlNode::Text(text) => out.push_str(&partial_escape(text.as_str())),
                XmlNode::CData(text) => {
                    out.push_str("<![CDATA[");
                    out.push_str(text);
                    out.push_str("]]>");
                }
                XmlNode::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                XmlNode::ProcessingInstruction(text) => {
                    out.push_str("<?");
                    out.push_str(text);
                    out.push_str("?>");
                }
            }
        }
        out.push_str("</");
        out.push_str(&qname);
        out.push('>');
    }

    scope.bindings.truncate(mark);
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    // Attribute-value normalization would turn raw whitespace controls into spaces
    let escaped = escape(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;");
    out.push_str(&escaped);
    out.push('"');
}
