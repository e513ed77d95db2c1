/*
 * native.rs
 * Copyright (c) 2025 The textext authors
 *
 * NativeRuntime: SystemRuntime backed by std::fs and std::process.
 */

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::traits::{
    CommandOutput, ExecOptions, PathKind, RuntimeError, RuntimeResult, SystemRuntime, TempDir,
};

/// Runtime with full access to the host system.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// Create a new native runtime.
    pub fn new() -> Self {
        Self
    }
}

impl SystemRuntime for NativeRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()> {
        Ok(std::fs::write(path, contents)?)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        // Follows links, like Path::is_file does
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        Ok(match kind {
            None => true,
            Some(PathKind::File) => metadata.is_file(),
            Some(PathKind::Directory) => metadata.is_dir(),
        })
    }

    fn temp_dir(&self, template: &str) -> RuntimeResult<TempDir> {
        let dir = tempfile::Builder::new().prefix(template).tempdir()?;
        // Ownership moves to our own guard so every runtime shares one cleanup path
        Ok(TempDir::new(dir.keep()))
    }

    fn exec_command(
        &self,
        command: &str,
        args: &[&str],
        options: &ExecOptions,
    ) -> RuntimeResult<CommandOutput> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        for (name, value) in &options.env {
            cmd.env(name, value);
        }

        let child = cmd.spawn().map_err(|source| RuntimeError::Launch {
            command: command.to_string(),
            source,
        })?;
        let output = child.wait_with_output()?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn env_get(&self, name: &str) -> RuntimeResult<Option<String>> {
        match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(RuntimeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Environment variable {} is not valid UTF-8", name),
            ))),
        }
    }

    fn find_binary(&self, name: &str, env_var: &str) -> Option<PathBuf> {
        if let Ok(Some(path_str)) = self.env_get(env_var) {
            let path = PathBuf::from(path_str);
            if path.is_file() {
                return Some(path);
            }
        }
        which::which(name).ok()
    }
}
