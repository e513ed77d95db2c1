//! Validated conversion requests.

use std::path::{Path, PathBuf};

use crate::error::{Result, TextextError};

/// Markup to typeset plus how to typeset it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    text: String,
    preamble_file: PathBuf,
    scale_factor: f64,
}

impl ConversionRequest {
    /// # Errors
    ///
    /// [`TextextError::InvalidRequest`] if `scale_factor` is not a finite
    /// positive number.
    pub fn new(
        text: impl Into<String>,
        preamble_file: impl Into<PathBuf>,
        scale_factor: f64,
    ) -> Result<Self> {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return Err(TextextError::InvalidRequest(format!(
                "scale factor must be a positive number, got {}",
                scale_factor
            )));
        }
        Ok(Self {
            text: text.into(),
            preamble_file: preamble_file.into(),
            scale_factor,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn preamble_file(&self) -> &Path {
        &self.preamble_file
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
