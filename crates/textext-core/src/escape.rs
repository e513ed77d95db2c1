/*
 * escape.rs
 * Copyright (c) 2025 The textext authors
 *
 * Single-line escape codec for markup stored in SVG attributes.
 */

//! Reversible escaping of markup for storage in an attribute value.
//!
//! Multi-line LaTeX has to survive a trip through an XML attribute, and
//! older documents store it in Python's `string-escape` form. [`encode`]
//! produces that form: backslash, single quote and control characters are
//! escaped so the result is a single line. [`decode`] is the strict inverse.
//!
//! `\xNN` escapes denote raw bytes. Legacy documents escaped every byte of
//! non-ASCII text this way, so the decoded bytes are reassembled as UTF-8:
//!
//! ```rust
//! use textext_core::escape::{decode, encode};
//!
//! assert_eq!(encode("a\\b\n"), "a\\\\b\\n");
//! assert_eq!(decode("caf\\xc3\\xa9").unwrap(), "café");
//! ```

use thiserror::Error;

/// Errors from [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("trailing backslash at byte {0}")]
    TrailingBackslash(usize),

    #[error("unknown escape sequence '\\{sequence}' at byte {position}")]
    UnknownEscape { sequence: char, position: usize },

    #[error("incomplete \\x escape at byte {0}")]
    TruncatedHex(usize),

    #[error("escaped bytes do not form valid UTF-8")]
    InvalidUtf8,
}

/// Escape `text` into a single line.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Undo [`encode`], also accepting `\"` and byte escapes of non-ASCII text.
pub fn decode(escaped: &str) -> Result<String, EscapeError> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let Some(&code) = bytes.get(i + 1) else {
            return Err(EscapeError::TrailingBackslash(i));
        };
        match code {
            b'\\' => out.push(b'\\'),
            b'\'' => out.push(b'\''),
            b'"' => out.push(b'"'),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'x' => {
                let byte = bytes
                    .get(i + 2..i + 4)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or(EscapeError::TruncatedHex(i))?;
                out.push(byte);
                i += 4;
                continue;
            }
            _ => {
                // Report the whole character, which may be multi-byte
                let sequence = escaped[i + 1..].chars().next().unwrap_or('\u{fffd}');
                return Err(EscapeError::UnknownEscape {
                    sequence,
                    position: i,
                });
            }
        }
        i += 2;
    }

    String::from_utf8(out).map_err(|_| EscapeError::InvalidUtf8)
}
