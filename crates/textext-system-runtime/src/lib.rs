/*
 * textext-system-runtime
 * Copyright (c) 2025 The textext authors
 *
 * Runtime abstraction layer for textext system operations.
 *
 * The conversion pipeline never touches std::fs or std::process directly.
 * Everything goes through the SystemRuntime trait so the pipeline can be
 * driven against scripted tools in tests:
 *
 * - NativeRuntime: Full system access using std
 */

mod native;
mod traits;

// Re-export core types (API surface)
pub use traits::{
    CommandOutput, ExecOptions, PathKind, RuntimeError, RuntimeResult, SystemRuntime, TempDir,
};

// Re-export runtime implementations
pub use native::NativeRuntime;
