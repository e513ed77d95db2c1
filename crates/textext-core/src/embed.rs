/*
 * embed.rs
 * Copyright (c) 2025 The textext authors
 *
 * Finding, tagging and splicing embedded objects in the host document.
 */

//! Embedded objects in the host document.
//!
//! An embedded object is an SVG `<g>` carrying the markup it was typeset
//! from in `textext:text` and `textext:preamble`, both escaped with
//! [`crate::escape`]. Objects written by old versions use the unqualified
//! `textext` and `texpreamble` attributes instead; those are still read but
//! never written.

use textext_xml::{NodePath, XmlDocument, XmlElement, XmlName};

use crate::error::Result;
use crate::escape;
use crate::normalize::{host_id_limit, id_limit, next_id, repair_namespace};

/// Namespace of the round-trip metadata attributes.
pub const TEXTEXT_NS: &str = "http://www.iki.fi/pav/software/textext/";

/// Prefix used when writing [`TEXTEXT_NS`] attributes.
pub const TEXTEXT_PREFIX: &str = "textext";

/// Preamble file used when nothing else is known.
pub const DEFAULT_PREAMBLE: &str = "header.inc";

const LEGACY_TEXT: &str = "textext";
const LEGACY_PREAMBLE: &str = "texpreamble";

/// A previously embedded object found among the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousObject {
    /// Where the object sits in the host document.
    pub path: NodePath,
    pub id: String,
    /// Decoded markup.
    pub text: String,
    /// Decoded preamble file name; empty when the object had none.
    pub preamble_file: String,
    /// Placement chosen by the user, copied onto the replacement.
    pub transform: Option<String>,
}

/// First selected `<g>` that carries round-trip metadata.
///
/// Ids that do not resolve and elements that are not groups are skipped.
///
/// # Errors
///
/// Fails if the metadata of the first matching object cannot be decoded.
pub fn find_previous(doc: &XmlDocument, ids: &[String]) -> Result<Option<PreviousObject>> {
    for id in ids {
        let Some(path) = doc.find_by_id(id) else {
            tracing::debug!(id = %id, "Selected id not found in document");
            continue;
        };
        let Some(node) = doc.element(&path) else {
            continue;
        };
        if node.name.local != "g" {
            continue;
        }

        let (text, preamble) = if let Some(text) = node.attribute(Some(TEXTEXT_NS), "text") {
            (text, node.attribute(Some(TEXTEXT_NS), "preamble"))
        } else if let Some(text) = node.get_attribute(LEGACY_TEXT) {
            (text, node.get_attribute(LEGACY_PREAMBLE))
        } else {
            continue;
        };

        return Ok(Some(PreviousObject {
            path,
            id: id.clone(),
            text: escape::decode(text)?,
            preamble_file: escape::decode(preamble.unwrap_or(""))?,
            transform: node.get_attribute("transform").map(str::to_string),
        }));
    }
    Ok(None)
}

/// Record the markup a fragment was made from.
pub fn tag_fragment(fragment: &mut XmlElement, text: &str, preamble_file: &str) {
    fragment.set_attribute(
        XmlName::prefixed(TEXTEXT_NS, TEXTEXT_PREFIX, "text"),
        escape::encode(text),
    );
    fragment.set_attribute(
        XmlName::prefixed(TEXTEXT_NS, TEXTEXT_PREFIX, "preamble"),
        escape::encode(preamble_file),
    );
}

/// Put `fragment` into `doc`, returning its path.
///
/// Without a previous object the fragment is appended to the document
/// element. Otherwise it takes the previous object's place among its
/// siblings and inherits its `id` and `transform`, so the object keeps its
/// identity and placement across edits.
///
/// A new fragment whose id is missing, or already taken in `doc`, gets the
/// next free `textext-obj-N`, so selecting it by id finds it again.
///
/// # Errors
///
/// Fails if no `textext-obj-N` id is left, or `previous` no longer points
/// at an element of `doc`.
pub fn embed(
    doc: &mut XmlDocument,
    mut fragment: XmlElement,
    previous: Option<&PreviousObject>,
) -> Result<NodePath> {
    if let Some(previous) = previous {
        fragment.set_id(previous.id.as_str());
        if let Some(transform) = &previous.transform {
            fragment.set_attribute(XmlName::local("transform"), transform.as_str());
        }
    } else if fragment
        .id()
        .is_none_or(|id| doc.find_by_id(id).is_some())
    {
        let id = next_id(host_id_limit(doc).max(id_limit(&fragment)))?;
        fragment.set_id(id);
    }
    repair_namespace(&mut fragment);

    match previous {
        None => Ok(doc.append_to_root(fragment)),
        Some(previous) => {
            doc.replace_element(&previous.path, fragment)?;
            Ok(previous.path.clone())
        }
    }
}
