//! Mutable, namespace-aware XML trees for editing SVG documents.
//!
//! This crate wraps [`quick-xml`] to provide an owned tree of
//! [`XmlElement`]s that can be searched, edited in place and written back
//! out. Names are stored as expanded names ([`XmlName`]) so that lookups do
//! not depend on which prefix a document happens to use.
//!
//! # Overview
//!
//! The main types are:
//! - [`XmlDocument`]: the document element plus the markup around it
//! - [`XmlElement`]: an element with namespace declarations, attributes and children
//! - [`XmlName`]: namespace URI, preferred prefix and local name
//! - [`NodePath`]: a stable address of an element inside a document
//!
//! # Example
//!
//! ```rust
//! use textext_xml::{parse, XmlName};
//!
//! let mut doc = parse(r#"<svg xmlns="http://www.w3.org/2000/svg">
//!   <g id="g1"/>
//! </svg>"#).unwrap();
//!
//! let path = doc.find_by_id("g1").unwrap();
//! let g = doc.element_mut(&path).unwrap();
//! g.set_attribute(XmlName::prefixed("urn:example", "ex", "note"), "hi");
//!
//! assert!(doc
//!     .to_xml_string()
//!     .contains(r#"<g xmlns:ex="urn:example" id="g1" ex:note="hi"/>"#));
//! ```

pub mod error;
pub mod parser;
pub mod types;
mod writer;

// Re-export main types
pub use error::{Error, Result};
pub use parser::parse;
pub use types::{
    Descendants, NamespaceDecl, NodePath, SVG_NS, XLINK_NS, XML_NS, XmlAttribute, XmlDocument,
    XmlElement, XmlMisc, XmlName, XmlNode,
};
