//! `pstoedit -f plot-svg`: one tool, namespace-less SVG with a flipped y axis.

use std::path::PathBuf;

use super::{ConversionContext, PSTOEDIT_OPTIONS};
use crate::error::Result;
use crate::latex::{PDF_FILE, SVG_FILE};
use crate::runner::{CommandRunner, Invocation};
use crate::tools::ToolPaths;

/// The plot-svg driver is optional in pstoedit builds, so look for it in the
/// `-help` listing. pstoedit exits with 1 after printing help.
pub(super) fn probe(runner: &CommandRunner, tools: &ToolPaths) -> Result<bool> {
    let help = runner.run(
        &Invocation::new(tools.pstoedit.as_str())
            .arg("-help")
            .expect_exit(Some(1)),
    )?;
    Ok(help.contains("plot-svg"))
}

pub(super) fn pdf_to_svg(ctx: &ConversionContext<'_>) -> Result<PathBuf> {
    let pdf = ctx.scratch_file(PDF_FILE);
    let svg = ctx.scratch_file(SVG_FILE);
    ctx.runner.run(
        &Invocation::new(ctx.tools.pstoedit.as_str())
            .args(["-f", "plot-svg"])
            .arg(pdf.to_string_lossy())
            .arg(svg.to_string_lossy())
            .args(PSTOEDIT_OPTIONS),
    )?;
    ctx.require_output(SVG_FILE, "pstoedit")
}
