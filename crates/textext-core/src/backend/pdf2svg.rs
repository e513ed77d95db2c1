//! `pdf2svg`: one tool, glyphs kept as `<symbol>`/`<use>` pairs.

use std::path::PathBuf;

use super::ConversionContext;
use crate::error::Result;
use crate::latex::{PDF_FILE, SVG_FILE};
use crate::runner::{CommandRunner, Invocation};
use crate::tools::ToolPaths;

/// `pdf2svg` prints its usage and exits with 254 when run bare.
pub(super) fn probe(runner: &CommandRunner, tools: &ToolPaths) -> Result<bool> {
    runner.run(&Invocation::new(tools.pdf2svg.as_str()).expect_exit(Some(254)))?;
    Ok(true)
}

/// Convert page 1 of the PDF.
pub(super) fn pdf_to_svg(ctx: &ConversionContext<'_>) -> Result<PathBuf> {
    let pdf = ctx.scratch_file(PDF_FILE);
    let svg = ctx.scratch_file(SVG_FILE);
    ctx.runner.run(
        &Invocation::new(ctx.tools.pdf2svg.as_str())
            .arg(pdf.to_string_lossy())
            .arg(svg.to_string_lossy())
            .arg("1"),
    )?;
    ctx.require_output(SVG_FILE, "pdf2svg")
}
