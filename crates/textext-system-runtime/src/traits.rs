/*
 * traits.rs
 * Copyright (c) 2025 The textext authors
 *
 * Defines the SystemRuntime trait and supporting types for the runtime abstraction layer.
 */

use std::io;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug)]
pub enum RuntimeError {
    /// Standard I/O error
    Io(io::Error),

    /// The external program could not be started at all
    /// (missing executable, permission denied, ...).
    Launch {
        /// Program that was being started
        command: String,
        /// Underlying spawn error
        source: io::Error,
    },

    /// Operation not supported on this runtime
    NotSupported(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
            RuntimeError::Launch { command, source } => {
                write!(f, "Failed to start {}: {}", command, source)
            }
            RuntimeError::NotSupported(msg) => write!(f, "Operation not supported: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            RuntimeError::Launch { source, .. } => Some(source),
            RuntimeError::NotSupported(_) => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> Self {
        RuntimeError::Io(e)
    }
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Output from a command execution
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (0 = success, -1 when the process was killed by a signal)
    pub code: i32,
    /// Standard output
    pub stdout: Vec<u8>,
    /// Standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Get stdout as a string (lossy UTF-8 conversion)
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Get stderr as a string (lossy UTF-8 conversion)
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Get stdout followed by stderr as one string.
    pub fn combined_string(&self) -> String {
        let mut combined = self.stdout_string();
        combined.push_str(&self.stderr_string());
        combined
    }
}

/// How to launch an external command.
///
/// The child always gets a null stdin. By default it inherits the current
/// working directory and the full environment of this process.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory for the child process
    pub cwd: Option<PathBuf>,
    /// Extra environment variables, applied on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl ExecOptions {
    /// Options with no working directory or environment overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the child in `dir`.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set one environment variable for the child only.
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }
}

/// RAII guard for a temporary directory that cleans up on drop
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    /// Create a new TempDir from a path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if self.path.exists() {
            // Nothing useful can be done with a failure while unwinding
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

impl std::fmt::Debug for TempDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempDir")
            .field("path", &self.path)
            .finish()
    }
}

/// Trait defining the low-level system operations used by the pipeline.
///
/// Implementations provide the actual system interaction. The native
/// implementation talks to the real filesystem and spawns real processes;
/// test implementations script the external tools.
pub trait SystemRuntime: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // FILE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Read entire file contents as bytes.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read file as string with UTF-8 encoding.
    ///
    /// Default implementation reads bytes and converts to string.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            RuntimeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in file: {}", e),
            ))
        })
    }

    /// Write bytes to file (creates or overwrites).
    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()>;

    /// Check if path exists, optionally filtering by type.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool>;

    /// Check if path exists and is a file.
    ///
    /// Convenience method that calls `path_exists` with `PathKind::File`.
    fn is_file(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::File))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DIRECTORY OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Create a fresh, private temporary directory whose name starts with
    /// `template`. The directory is removed when the returned guard drops.
    fn temp_dir(&self, template: &str) -> RuntimeResult<TempDir>;

    // ═══════════════════════════════════════════════════════════════════════
    // PROCESS EXECUTION
    // ═══════════════════════════════════════════════════════════════════════

    /// Execute command with full output capture.
    ///
    /// Blocks until the child exits. Returns exit code and both stdout and
    /// stderr; a non-zero exit code is NOT an error at this level. Failing
    /// to start the program at all is reported as [`RuntimeError::Launch`].
    fn exec_command(
        &self,
        command: &str,
        args: &[&str],
        options: &ExecOptions,
    ) -> RuntimeResult<CommandOutput>;

    // ═══════════════════════════════════════════════════════════════════════
    // ENVIRONMENT
    // ═══════════════════════════════════════════════════════════════════════

    /// Get single environment variable.
    fn env_get(&self, name: &str) -> RuntimeResult<Option<String>>;

    // ═══════════════════════════════════════════════════════════════════════
    // BINARY DISCOVERY
    // ═══════════════════════════════════════════════════════════════════════

    /// Find a binary by checking an environment variable first, then PATH.
    ///
    /// The `env_var` parameter names an environment variable that may hold
    /// the path to the binary (e.g. `TEXTEXT_PDFLATEX` for pdflatex).
    ///
    /// Default implementation checks the environment variable but does not
    /// search PATH. `NativeRuntime` overrides this to use `which::which()`.
    fn find_binary(&self, name: &str, env_var: &str) -> Option<PathBuf> {
        if let Ok(Some(path_str)) = self.env_get(env_var) {
            let path = PathBuf::from(path_str);
            if self.is_file(&path).unwrap_or(false) {
                return Some(path);
            }
        }
        let _ = name;
        None
    }
}
