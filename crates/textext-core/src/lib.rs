/*
 * textext-core
 * Copyright (c) 2025 The textext authors
 *
 * LaTeX to SVG conversion and re-editable embedding.
 */

//! Core of textext: typeset LaTeX markup into an SVG group and embed it in
//! a host SVG document so that it can be edited again later.
//!
//! The pipeline runs external programs through a
//! [`textext_system_runtime::SystemRuntime`]:
//!
//! ```text
//! markup --pdflatex--> tmp.pdf --backend--> tmp.svg --normalize--> <g> --embed--> host
//! ```
//!
//! [`Session`] is the entry point; the modules below it can also be used on
//! their own.

pub mod backend;
pub mod embed;
pub mod error;
pub mod escape;
pub mod latex;
pub mod normalize;
pub mod prompt;
pub mod request;
pub mod runner;
pub mod session;
pub mod tools;

pub use backend::{Backend, ConversionContext};
pub use embed::{PreviousObject, TEXTEXT_NS};
pub use error::{Result, TextextError};
pub use prompt::{NoPrompt, PromptValues, TextPrompt};
pub use request::ConversionRequest;
pub use runner::{CommandRunner, Invocation};
pub use session::{Session, SessionOptions, SessionOutcome};
pub use tools::ToolPaths;
