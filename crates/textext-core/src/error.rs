//! Error types for textext-core

use textext_system_runtime::RuntimeError;
use thiserror::Error;

use crate::escape::EscapeError;

#[derive(Error, Debug)]
pub enum TextextError {
    /// The external program could not be started.
    #[error("Failed to start {command}: {message}")]
    ToolLaunch { command: String, message: String },

    /// The external program ran but exited with an unexpected status.
    /// `output` is everything it printed, for the user to read.
    #[error("Command {command} failed with exit code {code}:\n{output}")]
    ToolExecution {
        command: String,
        code: i32,
        output: String,
    },

    #[error("{0}")]
    Conversion(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid escaped attribute value: {0}")]
    Escape(#[from] EscapeError),

    #[error("XML error: {0}")]
    Xml(#[from] textext_xml::Error),

    #[error("Runtime error: {0}")]
    Runtime(#[source] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TextextError {
    /// Create a conversion error from any message.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }
}

impl From<RuntimeError> for TextextError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Launch { command, source } => TextextError::ToolLaunch {
                command,
                message: source.to_string(),
            },
            other => TextextError::Runtime(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TextextError>;
