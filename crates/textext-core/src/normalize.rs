/*
 * normalize.rs
 * Copyright (c) 2025 The textext authors
 *
 * Turning converter output into a group that can live in the host document.
 */

//! Fragment normalization.
//!
//! Converter output is a complete SVG document. Before it can be merged into
//! the host it is reduced to a single `<g>`:
//!
//! - [`extract_first_group`] takes the first group of the output as is.
//! - [`renumber_into_group`] keeps all content but renames every id to
//!   `textext-obj-N`, continuing after the highest such id already in the
//!   host (see [`host_id_limit`]), and rewrites references to match:
//!   `href` values and every `url(#id)` in any attribute, `style` included.
//!
//! [`repair_namespace`] then puts namespace-less elements into the SVG
//! namespace.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use textext_xml::{SVG_NS, XLINK_NS, XmlDocument, XmlElement, XmlName};

use crate::error::{Result, TextextError};

/// Prefix of ids assigned by [`renumber_into_group`].
pub const ID_PREFIX: &str = "textext-obj-";

/// `url(#id)`, optionally quoted; group 1 is the `#id` part.
static URL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?(#[^)'"\s]+)['"]?\s*\)"#).expect("valid regex")
});

/// Highest `N` among `textext-obj-N` ids in `host`, or 0.
///
/// Ids with the prefix but a non-numeric suffix are ignored.
pub fn host_id_limit(host: &XmlDocument) -> u64 {
    id_limit(&host.root)
}

/// Highest `N` among `textext-obj-N` ids in `element` and its descendants.
pub fn id_limit(element: &XmlElement) -> u64 {
    element
        .descendants()
        .filter_map(|el| el.id()?.strip_prefix(ID_PREFIX)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// `textext-obj-N` for the number following `after`.
pub fn next_id(after: u64) -> Result<String> {
    after
        .checked_add(1)
        .map(|n| format!("{}{}", ID_PREFIX, n))
        .ok_or_else(|| TextextError::conversion("No free textext-obj id left in the document"))
}

/// The first `g` below the document element, in document order.
pub fn extract_first_group(document: XmlDocument) -> Option<XmlElement> {
    let group = document.root.find_descendant("g").cloned();
    if group.is_none() {
        tracing::debug!("Converter output contains no group");
    }
    group
}

/// Renumber all ids of `document` after `start`, fix up references, and
/// gather the document element's children into a new `<g>`.
///
/// # Errors
///
/// Fails if the numbering would run past `u64::MAX`.
pub fn renumber_into_group(mut document: XmlDocument, start: u64) -> Result<XmlElement> {
    let mut counter = start;
    let mut exhausted = None;
    let mut renamed: HashMap<String, String> = HashMap::new();

    document.root.for_each_element_mut(&mut |el| {
        let Some(old) = el.id().map(str::to_string) else {
            return;
        };
        match next_id(counter) {
            Ok(new) => {
                counter += 1;
                renamed.insert(format!("#{}", old), format!("#{}", new));
                el.set_id(new);
            }
            Err(e) => {
                exhausted.get_or_insert(e);
            }
        }
    });
    if let Some(e) = exhausted {
        return Err(e);
    }
    tracing::debug!(count = counter - start, after = start, "Renumbered fragment ids");

    // References may point forward, so rewriting waits until every id is known
    document.root.for_each_element_mut(&mut |el| {
        for attr in &mut el.attributes {
            let is_href = attr.name.local == "href"
                && matches!(attr.name.namespace.as_deref(), None | Some(XLINK_NS));
            if is_href {
                rewrite_reference(&mut attr.value, &renamed);
            } else if attr.value.contains("url(") {
                rewrite_urls(&mut attr.value, &renamed);
            }
        }
    });

    let mut group = XmlElement::new(XmlName::namespaced(SVG_NS, "g"));
    group.children = std::mem::take(&mut document.root.children);
    Ok(group)
}

fn rewrite_reference(value: &mut String, renamed: &HashMap<String, String>) {
    // Embedded images carry `data:` URIs here
    if !value.starts_with('#') {
        return;
    }
    match renamed.get(value.as_str()) {
        Some(new) => *value = new.clone(),
        None => tracing::warn!(reference = %value, "Reference to unknown id left unchanged"),
    }
}

/// Rewrite the target of every `url(#id)` in `value`, e.g. in
/// `mask="url(#mask0)"` or `style="fill:url(#linear0);stroke:none"`.
fn rewrite_urls(value: &mut String, renamed: &HashMap<String, String>) {
    let mut rewritten = String::with_capacity(value.len());
    let mut copied = 0;
    for caps in URL_REFERENCE.captures_iter(value) {
        let Some(target) = caps.get(1) else {
            continue;
        };
        match renamed.get(target.as_str()) {
            Some(new) => {
                rewritten.push_str(&value[copied..target.start()]);
                rewritten.push_str(new);
                copied = target.end();
            }
            None => tracing::warn!(
                reference = target.as_str(),
                "Reference to unknown id left unchanged"
            ),
        }
    }
    if copied > 0 {
        rewritten.push_str(&value[copied..]);
        *value = rewritten;
    }
}

/// Put every element of `fragment` that has no namespace into the SVG
/// namespace. Elements in other namespaces are left alone.
pub fn repair_namespace(fragment: &mut XmlElement) {
    fragment.for_each_element_mut(&mut |el| {
        if el.name.namespace.is_none() {
            el.name.namespace = Some(SVG_NS.to_string());
            el.name.prefix = None;
        }
    });
}
