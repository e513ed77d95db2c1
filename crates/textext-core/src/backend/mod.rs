/*
 * backend/mod.rs
 * Copyright (c) 2025 The textext authors
 *
 * The PDF to SVG conversion strategies.
 */

//! Conversion backends.
//!
//! A [`Backend`] is one complete toolchain for turning the PDF produced by
//! [`crate::latex`] into an SVG group. The set is closed:
//!
//! | backend | tools | fragment | default transform |
//! |---|---|---|---|
//! | [`Backend::Pdf2Svg`] | `pdf2svg` | all content, ids renumbered | `scale(s,s)` |
//! | [`Backend::PstoeditPlotSvg`] | `pstoedit -f plot-svg` | first `g` | `matrix(s,0,0,-s,-200s,750s)` |
//! | [`Backend::SkConvert`] | `pstoedit -f sk`, `skconvert` | first `g` | `scale(s,s)` |
//!
//! Sessions try backends in the order given to them; [`Backend::DEFAULT_ORDER`]
//! is the usual preference.

mod pdf2svg;
mod plot_svg;
mod skconvert;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use textext_xml::{XmlDocument, XmlElement};

use crate::error::{Result, TextextError};
use crate::latex;
use crate::normalize;
use crate::request::ConversionRequest;
use crate::runner::CommandRunner;
use crate::tools::ToolPaths;

/// Everything one conversion attempt needs.
#[derive(Debug)]
pub struct ConversionContext<'a> {
    pub runner: &'a CommandRunner,
    pub tools: &'a ToolPaths,
    /// Private scratch directory of this attempt.
    pub scratch: &'a Path,
}

impl ConversionContext<'_> {
    /// Path of `name` inside the scratch directory.
    pub fn scratch_file(&self, name: &str) -> PathBuf {
        self.scratch.join(name)
    }

    /// Fail unless `tool` left `name` behind in the scratch directory.
    pub(crate) fn require_output(&self, name: &str, tool: &str) -> Result<PathBuf> {
        let path = self.scratch_file(name);
        if !self.runner.runtime().is_file(&path)? {
            return Err(TextextError::conversion(format!(
                "{} didn't produce output",
                tool
            )));
        }
        Ok(path)
    }
}

/// A PDF to SVG toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Pdf2Svg,
    PstoeditPlotSvg,
    SkConvert,
}

impl Backend {
    /// Preferred order when the user does not choose.
    pub const DEFAULT_ORDER: [Backend; 3] =
        [Backend::Pdf2Svg, Backend::PstoeditPlotSvg, Backend::SkConvert];

    /// Name used on the command line and in messages.
    pub fn name(self) -> &'static str {
        match self {
            Backend::Pdf2Svg => "pdf2svg",
            Backend::PstoeditPlotSvg => "pstoedit-plot-svg",
            Backend::SkConvert => "skconvert",
        }
    }

    /// Whether this backend's tools are installed and answer as expected.
    ///
    /// Never fails: any error while probing means "not available".
    pub fn probe(self, runner: &CommandRunner, tools: &ToolPaths) -> bool {
        let result = match self {
            Backend::Pdf2Svg => pdf2svg::probe(runner, tools),
            Backend::PstoeditPlotSvg => plot_svg::probe(runner, tools),
            Backend::SkConvert => skconvert::probe(runner, tools),
        };
        match result {
            Ok(available) => {
                tracing::debug!(backend = self.name(), available, "Probed backend");
                available
            }
            Err(e) => {
                tracing::debug!(backend = self.name(), error = %e, "Backend unavailable");
                false
            }
        }
    }

    /// Default `transform` for a fragment typeset at `scale_factor`.
    pub fn transform(self, scale_factor: f64) -> String {
        let s = scale_factor;
        match self {
            Backend::Pdf2Svg | Backend::SkConvert => format!("scale({:.6},{:.6})", s, s),
            Backend::PstoeditPlotSvg => format!(
                "matrix({:.6},0,0,{:.6},{:.6},{:.6})",
                s,
                -s,
                -200.0 * s,
                750.0 * s
            ),
        }
    }

    /// Typeset `request` and return the fragment to embed in `host`, with
    /// the default transform set.
    ///
    /// `Ok(None)` means the converter produced nothing usable; callers
    /// treat it as a no-op.
    pub fn convert(
        self,
        ctx: &ConversionContext<'_>,
        request: &ConversionRequest,
        host: &XmlDocument,
    ) -> Result<Option<XmlElement>> {
        latex::compile(ctx, request)?;

        let svg_path = match self {
            Backend::Pdf2Svg => pdf2svg::pdf_to_svg(ctx)?,
            Backend::PstoeditPlotSvg => plot_svg::pdf_to_svg(ctx)?,
            Backend::SkConvert => skconvert::pdf_to_svg(ctx)?,
        };

        let source = ctx.runner.runtime().file_read_string(&svg_path)?;
        let document = textext_xml::parse(&source)?;

        let fragment = match self {
            Backend::Pdf2Svg => {
                let start = normalize::host_id_limit(host);
                Some(normalize::renumber_into_group(document, start)?)
            }
            Backend::PstoeditPlotSvg | Backend::SkConvert => {
                normalize::extract_first_group(document)
            }
        };

        Ok(fragment.map(|mut group| {
            group.set_attribute(
                textext_xml::XmlName::local("transform"),
                self.transform(request.scale_factor()),
            );
            group
        }))
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = TextextError;

    fn from_str(s: &str) -> Result<Self> {
        Backend::DEFAULT_ORDER
            .into_iter()
            .find(|backend| backend.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Backend::DEFAULT_ORDER.iter().map(|b| b.name()).collect();
                TextextError::InvalidRequest(format!(
                    "unknown backend '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// pstoedit options shared by the pstoedit-based backends: draw text as
/// polygons, keep subpaths, and render at high resolution.
const PSTOEDIT_OPTIONS: [&str; 4] = ["-dt", "-ssp", "-psarg", "-r9600x9600"];
