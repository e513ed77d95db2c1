//! Version handling for textext
//!
//! The CLI reports the crate version, with a `-dev` suffix when the binary
//! was built without optimizations so bug reports from local builds are
//! easy to tell apart from released ones.

const PROGRAM_NAME: &str = "textext";

#[cfg(debug_assertions)]
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-dev");
#[cfg(not(debug_assertions))]
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the version string that should be reported by the CLI
pub fn cli_version() -> &'static str {
    VERSION
}

/// Get the Cargo package version (for internal use)
pub fn cargo_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// One-line program identification, e.g. `textext 0.3.0`.
pub fn banner() -> String {
    format!("{} {}", PROGRAM_NAME, cli_version())
}
