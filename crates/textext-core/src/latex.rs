/*
 * latex.rs
 * Copyright (c) 2025 The textext authors
 *
 * Stage 1: typeset the user's markup to PDF with pdflatex.
 */

//! Markup to PDF.
//!
//! The markup is wrapped in a minimal landscape A0 document so that even
//! wide formulas fit on the first page, with the contents of the preamble
//! file injected before `\begin{document}`.

use std::path::{Path, PathBuf};

use textext_system_runtime::SystemRuntime;

use crate::backend::ConversionContext;
use crate::error::{Result, TextextError};
use crate::request::ConversionRequest;
use crate::runner::Invocation;

/// Scratch file names, all sharing the `tmp` base.
pub const TEX_FILE: &str = "tmp.tex";
pub const PDF_FILE: &str = "tmp.pdf";
pub const SVG_FILE: &str = "tmp.svg";
pub const SK_FILE: &str = "tmp.sk";

/// The complete LaTeX document for `text`.
///
/// The preamble is copied byte for byte, so files in a legacy encoding
/// (say `\usepackage[latin1]{inputenc}` with Latin-1 text) reach pdflatex
/// unchanged.
pub fn wrap_document(preamble: &[u8], text: &str) -> Vec<u8> {
    let mut source = Vec::with_capacity(preamble.len() + text.len() + 128);
    source.extend_from_slice(b"\\documentclass[landscape,a0]{article}\n");
    source.extend_from_slice(preamble);
    source.extend_from_slice(
        b"\n\\pagestyle{empty}\n\\begin{document}\n\\noindent\n",
    );
    source.extend_from_slice(text.as_bytes());
    source.extend_from_slice(b"\n\\end{document}\n");
    source
}

/// Contents of the preamble file, or nothing if there is no such file.
pub fn read_preamble(runtime: &dyn SystemRuntime, path: &Path) -> Result<Vec<u8>> {
    if !runtime.is_file(path)? {
        tracing::debug!(path = %path.display(), "No preamble file, using an empty preamble");
        return Ok(Vec::new());
    }
    Ok(runtime.file_read(path)?)
}

/// Write `tmp.tex` and run pdflatex on it. Returns the path of the PDF.
///
/// # Errors
///
/// Fails if pdflatex cannot be run, exits non-zero, or exits cleanly
/// without writing `tmp.pdf`.
pub fn compile(ctx: &ConversionContext<'_>, request: &ConversionRequest) -> Result<PathBuf> {
    let runtime = ctx.runner.runtime();
    let preamble = read_preamble(runtime, request.preamble_file())?;
    let source = wrap_document(&preamble, request.text());
    runtime.file_write(&ctx.scratch_file(TEX_FILE), &source)?;

    ctx.runner.run(
        &Invocation::new(ctx.tools.pdflatex.as_str())
            .args([TEX_FILE, "-interaction=nonstopmode", "-halt-on-error"])
            .cwd(ctx.scratch),
    )?;

    let pdf = ctx.scratch_file(PDF_FILE);
    if !runtime.is_file(&pdf)? {
        return Err(TextextError::conversion("pdflatex didn't produce output"));
    }
    Ok(pdf)
}
