//! `pstoedit -f sk` then `skconvert`: PDF to Sketch to SVG.

use std::path::PathBuf;

use super::{ConversionContext, PSTOEDIT_OPTIONS};
use crate::error::Result;
use crate::latex::{PDF_FILE, SK_FILE, SVG_FILE};
use crate::runner::{CommandRunner, Invocation};
use crate::tools::ToolPaths;

/// Both tools exit with 1 when run without arguments.
pub(super) fn probe(runner: &CommandRunner, tools: &ToolPaths) -> Result<bool> {
    runner.run(&Invocation::new(tools.pstoedit.as_str()).expect_exit(Some(1)))?;
    runner.run(&Invocation::new(tools.skconvert.as_str()).expect_exit(Some(1)))?;
    Ok(true)
}

pub(super) fn pdf_to_svg(ctx: &ConversionContext<'_>) -> Result<PathBuf> {
    let pdf = ctx.scratch_file(PDF_FILE);
    let sk = ctx.scratch_file(SK_FILE);
    ctx.runner.run(
        &Invocation::new(ctx.tools.pstoedit.as_str())
            .args(["-f", "sk"])
            .arg(pdf.to_string_lossy())
            .arg(sk.to_string_lossy())
            .args(PSTOEDIT_OPTIONS),
    )?;
    ctx.require_output(SK_FILE, "pstoedit")?;

    let svg = ctx.scratch_file(SVG_FILE);
    // skconvert misreads numbers under locales with a decimal comma
    ctx.runner.run(
        &Invocation::new(ctx.tools.skconvert.as_str())
            .arg(sk.to_string_lossy())
            .arg(svg.to_string_lossy())
            .env("LC_ALL", "C"),
    )?;
    ctx.require_output(SVG_FILE, "skconvert")
}
