//! XML parser that builds owned, namespace-resolved [`XmlDocument`] trees.

use crate::types::XML_NS;
use crate::{
    Error, NamespaceDecl, Result, XmlAttribute, XmlDocument, XmlElement, XmlMisc, XmlName,
    XmlNode,
};
use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Parse XML from a string, producing an [`XmlDocument`].
///
/// Element and attribute names are resolved against the namespace
/// declarations in scope; the prefixes used in the source are kept as
/// hints for serialization.
///
/// # Example
///
/// ```rust
/// use textext_xml::{parse, SVG_NS};
///
/// let doc = parse(r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="a"/></svg>"#).unwrap();
/// assert!(doc.root.is(Some(SVG_NS), "svg"));
/// assert_eq!(doc.root.elements().next().unwrap().id(), Some("a"));
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed, uses an undeclared prefix, or
/// has no document element.
pub fn parse(content: &str) -> Result<XmlDocument> {
    XmlParser::new(content).parse()
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    /// Stack of elements being built.
    stack: Vec<BuildNode>,

    /// In-scope namespace bindings, innermost last.
    scope: Vec<NamespaceDecl>,
}

/// A node being constructed during parsing.
struct BuildNode {
    /// Raw (prefixed) element name, for end-tag matching.
    raw_name: String,

    element: XmlElement,

    /// Length of `scope` before this element's declarations were pushed.
    scope_mark: usize,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            reader,
            stack: Vec::new(),
            scope: vec![NamespaceDecl {
                prefix: Some("xml".to_string()),
                uri: XML_NS.to_string(),
            }],
        }
    }

    fn parse(&mut self) -> Result<XmlDocument> {
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event_start = self.reader.buffer_position();

            let event = self.reader.read_event().map_err(|e| Error::XmlSyntax {
                message: e.to_string(),
                position: Some(self.reader.error_position()),
            })?;

            match event {
                Event::Start(e) => {
                    self.handle_start(&e)?;
                }
                Event::End(e) => {
                    let element = self.handle_end(&e)?;
                    self.attach(element, &mut root)?;
                }
                Event::Empty(e) => {
                    let (element, scope_mark) = self.handle_start_or_empty(&e)?;
                    self.scope.truncate(scope_mark);
                    self.attach(element, &mut root)?;
                }
                Event::Text(e) => {
                    self.handle_text(&e, event_start)?;
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.push_child(XmlNode::CData(text), event_start)?;
                }
                Event::Comment(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.push_misc_or_child(
                        XmlMisc::Comment(text.clone()),
                        XmlNode::Comment(text),
                        root.is_some(),
                        &mut prolog,
                        &mut epilog,
                    );
                }
                Event::PI(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.push_misc_or_child(
                        XmlMisc::ProcessingInstruction(text.clone()),
                        XmlNode::ProcessingInstruction(text),
                        root.is_some(),
                        &mut prolog,
                        &mut epilog,
                    );
                }
                Event::Decl(e) => {
                    prolog.push(XmlMisc::Declaration(
                        String::from_utf8_lossy(&e).into_owned(),
                    ));
                }
                Event::DocType(e) => {
                    prolog.push(XmlMisc::DocType(String::from_utf8_lossy(&e).into_owned()));
                }
                Event::Eof => break,
            }
        }

        // Check for unclosed elements
        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.raw_name),
            });
        }

        let root = root.ok_or(Error::EmptyDocument)?;
        Ok(XmlDocument {
            prolog,
            root,
            epilog,
        })
    }

    fn attach(&mut self, element: XmlElement, root: &mut Option<XmlElement>) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.element.push_element(element);
                Ok(())
            }
            None if root.is_some() => Err(Error::MultipleRoots),
            None => {
                *root = Some(element);
                Ok(())
            }
        }
    }

    fn push_child(&mut self, node: XmlNode, event_start: u64) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.element.children.push(node);
                Ok(())
            }
            None => Err(Error::XmlSyntax {
                message: "character data outside the document element".to_string(),
                position: Some(event_start),
            }),
        }
    }

    fn push_misc_or_child(
        &mut self,
        misc: XmlMisc,
        node: XmlNode,
        after_root: bool,
        prolog: &mut Vec<XmlMisc>,
        epilog: &mut Vec<XmlMisc>,
    ) {
        match self.stack.last_mut() {
            Some(parent) => parent.element.children.push(node),
            None if after_root => epilog.push(misc),
            None => prolog.push(misc),
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let (element, scope_mark) = self.handle_start_or_empty(e)?;
        self.stack.push(BuildNode {
            raw_name,
            element,
            scope_mark,
        });
        Ok(())
    }

    /// Build the element for a start or empty tag. The element's namespace
    /// declarations stay pushed on `scope`; the returned mark restores it.
    fn handle_start_or_empty(&mut self, e: &BytesStart<'_>) -> Result<(XmlElement, usize)> {
        let scope_mark = self.scope.len();
        let mut namespaces = Vec::new();
        let mut raw_attributes = Vec::new();

        for attr_result in e.attributes() {
            let attr = attr_result?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::XmlSyntax {
                    message: format!("Invalid attribute value: {}", err),
                    position: None,
                })?
                .into_owned();

            if key == "xmlns" {
                namespaces.push(NamespaceDecl {
                    prefix: None,
                    uri: value,
                });
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                namespaces.push(NamespaceDecl {
                    prefix: Some(prefix.to_string()),
                    uri: value,
                });
            } else {
                raw_attributes.push((key, value));
            }
        }

        // Declarations apply to the element's own name and attributes
        self.scope.extend(namespaces.iter().cloned());

        let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let name = self.resolve_element_name(&raw_name)?;

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            attributes.push(XmlAttribute {
                name: self.resolve_attribute_name(&key)?,
                value,
            });
        }

        Ok((
            XmlElement {
                name,
                namespaces,
                attributes,
                children: Vec::new(),
            },
            scope_mark,
        ))
    }

    fn handle_end(&mut self, e: &BytesEnd<'_>) -> Result<XmlElement> {
        let end_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let node = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("Unexpected closing tag </{}>", end_name),
        })?;

        // Verify tag names match
        if node.raw_name != end_name {
            return Err(Error::MismatchedEndTag {
                expected: node.raw_name,
                found: end_name,
            });
        }

        self.scope.truncate(node.scope_mark);
        Ok(node.element)
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: u64) -> Result<()> {
        let text = e
            .unescape()
            .map_err(|err| Error::XmlSyntax {
                message: format!("Invalid text content: {}", err),
                position: Some(event_start),
            })?
            .into_owned();

        // Whitespace between prolog items and around the root is not content
        if self.stack.is_empty() && text.trim().is_empty() {
            return Ok(());
        }
        self.push_child(XmlNode::Text(text), event_start)
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.scope
            .iter()
            .rev()
            .find(|decl| decl.prefix.as_deref() == prefix)
            .map(|decl| decl.uri.as_str())
    }

    fn resolve_element_name(&self, raw: &str) -> Result<XmlName> {
        match raw.split_once(':') {
            Some((prefix, local)) => {
                let uri = self.lookup(Some(prefix)).ok_or_else(|| Error::UnboundPrefix {
                    prefix: prefix.to_string(),
                })?;
                Ok(XmlName::prefixed(uri, prefix, local))
            }
            None => Ok(match self.lookup(None) {
                Some(uri) if !uri.is_empty() => XmlName::namespaced(uri, raw),
                _ => XmlName::local(raw),
            }),
        }
    }

    fn resolve_attribute_name(&self, raw: &str) -> Result<XmlName> {
        match raw.split_once(':') {
            Some((prefix, local)) => {
                let uri = self.lookup(Some(prefix)).ok_or_else(|| Error::UnboundPrefix {
                    prefix: prefix.to_string(),
                })?;
                Ok(XmlName::prefixed(uri, prefix, local))
            }
            // Unprefixed attributes never take the default namespace
            None => Ok(XmlName::local(raw)),
        }
    }
}
