/*
 * session.rs
 * Copyright (c) 2025 The textext authors
 *
 * One edit of one host document: pick a backend, get markup, convert, embed.
 */

//! The session driver.
//!
//! A [`Session`] performs a single create-or-edit operation:
//!
//! 1. probe the backends in order and pick the first available one
//! 2. recover the markup of a previously embedded object among the selection
//! 3. take the new markup from [`SessionOptions`] or ask a [`TextPrompt`]
//! 4. typeset it in a fresh scratch directory and normalize the result
//! 5. tag the fragment and splice it into the document
//!
//! The document is only touched in the last step, after every fallible
//! operation has succeeded, so a failed session leaves it unchanged.

use std::sync::Arc;

use textext_system_runtime::SystemRuntime;
use textext_xml::{NodePath, XmlDocument};

use crate::backend::{Backend, ConversionContext};
use crate::embed::{self, DEFAULT_PREAMBLE};
use crate::error::{Result, TextextError};
use crate::prompt::{PromptValues, TextPrompt};
use crate::request::ConversionRequest;
use crate::runner::CommandRunner;
use crate::tools::ToolPaths;

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Selected element ids, in selection order.
    pub ids: Vec<String>,
    /// Markup to typeset; `None` asks the prompt.
    pub text: Option<String>,
    pub preamble_file: String,
    pub scale_factor: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            text: None,
            preamble_file: DEFAULT_PREAMBLE.to_string(),
            scale_factor: 1.0,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// A new object was appended to the document element.
    Inserted { backend: Backend, path: NodePath },
    /// A previously embedded object was replaced in place.
    Replaced { backend: Backend, path: NodePath },
    /// The prompt was dismissed.
    Cancelled,
    /// The markup was empty; nothing to typeset.
    EmptyText,
    /// The converter output had nothing to embed.
    NoFragment,
}

impl SessionOutcome {
    /// Whether the document was changed.
    pub fn modified(&self) -> bool {
        matches!(
            self,
            SessionOutcome::Inserted { .. } | SessionOutcome::Replaced { .. }
        )
    }
}

/// Drives one conversion against a host document.
pub struct Session {
    runner: CommandRunner,
    backends: Vec<Backend>,
    tools: ToolPaths,
}

impl Session {
    /// `backends` are tried in the given order.
    pub fn new(runtime: Arc<dyn SystemRuntime>, backends: Vec<Backend>, tools: ToolPaths) -> Self {
        Self {
            runner: CommandRunner::new(runtime),
            backends,
            tools,
        }
    }

    /// First backend whose probe succeeds.
    pub fn select_backend(&self) -> Result<Backend> {
        self.backends
            .iter()
            .copied()
            .find(|backend| backend.probe(&self.runner, &self.tools))
            .ok_or_else(|| TextextError::conversion("No Latex -> SVG converter available"))
    }

    /// Run the session on `doc`.
    ///
    /// # Errors
    ///
    /// Any error leaves `doc` exactly as it was.
    pub fn run(
        &self,
        doc: &mut XmlDocument,
        options: &SessionOptions,
        prompt: &mut dyn TextPrompt,
    ) -> Result<SessionOutcome> {
        let backend = self.select_backend()?;
        tracing::info!(backend = backend.name(), "Using converter");

        let previous = embed::find_previous(doc, &options.ids)?;
        if let Some(previous) = &previous {
            tracing::debug!(id = %previous.id, "Editing existing object");
        }

        let values = match &options.text {
            Some(text) => PromptValues {
                text: text.clone(),
                preamble_file: options.preamble_file.clone(),
                scale_factor: options.scale_factor,
            },
            None => {
                let initial = match &previous {
                    Some(previous) => PromptValues {
                        text: previous.text.clone(),
                        preamble_file: previous.preamble_file.clone(),
                        scale_factor: 1.0,
                    },
                    None => PromptValues {
                        text: String::new(),
                        preamble_file: DEFAULT_PREAMBLE.to_string(),
                        scale_factor: 1.0,
                    },
                };
                match prompt.ask(initial) {
                    Some(values) => values,
                    None => {
                        tracing::info!("Cancelled");
                        return Ok(SessionOutcome::Cancelled);
                    }
                }
            }
        };

        if values.text.is_empty() {
            return Ok(SessionOutcome::EmptyText);
        }

        let request =
            ConversionRequest::new(values.text, values.preamble_file, values.scale_factor)?;

        let Some(mut fragment) = self.convert(backend, &request, doc)? else {
            tracing::info!(backend = backend.name(), "Converter produced nothing to embed");
            return Ok(SessionOutcome::NoFragment);
        };

        embed::tag_fragment(
            &mut fragment,
            request.text(),
            &request.preamble_file().to_string_lossy(),
        );

        let path = embed::embed(doc, fragment, previous.as_ref())?;
        Ok(match previous {
            Some(previous) => {
                tracing::info!(id = %previous.id, "Replaced object");
                SessionOutcome::Replaced { backend, path }
            }
            None => {
                tracing::info!(path = %path, "Inserted object");
                SessionOutcome::Inserted { backend, path }
            }
        })
    }

    /// One conversion attempt in its own scratch directory.
    fn convert(
        &self,
        backend: Backend,
        request: &ConversionRequest,
        host: &XmlDocument,
    ) -> Result<Option<textext_xml::XmlElement>> {
        // Removed when dropped, whatever the outcome
        let scratch = self.runner.runtime().temp_dir("textext")?;
        tracing::debug!(dir = %scratch.path().display(), "Created scratch directory");

        let ctx = ConversionContext {
            runner: &self.runner,
            tools: &self.tools,
            scratch: scratch.path(),
        };
        backend.convert(&ctx, request, host)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backends", &self.backends)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}
