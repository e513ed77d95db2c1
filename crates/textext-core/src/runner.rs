/*
 * runner.rs
 * Copyright (c) 2025 The textext authors
 *
 * Synchronous external command execution with exit-status checking.
 */

//! Running the external toolchain.
//!
//! Every tool the pipeline uses goes through [`CommandRunner::run`], which
//! waits for the program, captures its output and turns an unexpected exit
//! status into [`TextextError::ToolExecution`].

use std::path::PathBuf;
use std::sync::Arc;

use textext_system_runtime::{ExecOptions, SystemRuntime};

use crate::error::{Result, TextextError};

/// One external command to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Exit status that counts as success; `None` accepts any status.
    pub expected_exit: Option<i32>,
    /// Return stderr after stdout instead of stdout alone.
    pub combine_streams: bool,
    pub cwd: Option<PathBuf>,
    /// Variables set for this invocation only.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// A command expecting exit status 0, with combined output.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            expected_exit: Some(0),
            combine_streams: true,
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn expect_exit(mut self, code: Option<i32>) -> Self {
        self.expected_exit = code;
        self
    }

    /// Capture stdout only.
    pub fn stdout_only(mut self) -> Self {
        self.combine_streams = false;
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// The command line as it would be typed, for messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs [`Invocation`]s through a [`SystemRuntime`].
#[derive(Clone)]
pub struct CommandRunner {
    runtime: Arc<dyn SystemRuntime>,
}

impl CommandRunner {
    pub fn new(runtime: Arc<dyn SystemRuntime>) -> Self {
        Self { runtime }
    }

    /// The runtime commands are executed through.
    pub fn runtime(&self) -> &dyn SystemRuntime {
        self.runtime.as_ref()
    }

    /// Run `invocation` to completion and return its captured output.
    ///
    /// # Errors
    ///
    /// - [`TextextError::ToolLaunch`] when the program cannot be started
    /// - [`TextextError::ToolExecution`] when the exit status differs from
    ///   `expected_exit`; the error carries stdout and stderr combined
    pub fn run(&self, invocation: &Invocation) -> Result<String> {
        let mut options = ExecOptions::new();
        if let Some(cwd) = &invocation.cwd {
            options = options.cwd(cwd.clone());
        }
        for (name, value) in &invocation.env {
            options = options.env(name.clone(), value.clone());
        }

        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        let output = self
            .runtime
            .exec_command(&invocation.program, &args, &options)?;

        tracing::debug!(
            command = %invocation.command_line(),
            code = output.code,
            "Ran external command"
        );

        if let Some(expected) = invocation.expected_exit {
            if output.code != expected {
                return Err(TextextError::ToolExecution {
                    command: invocation.command_line(),
                    code: output.code,
                    output: output.combined_string(),
                });
            }
        }

        Ok(if invocation.combine_streams {
            output.combined_string()
        } else {
            output.stdout_string()
        })
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner").finish_non_exhaustive()
    }
}
