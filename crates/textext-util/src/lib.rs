//! Shared utilities for textext.

pub mod version;

pub use version::{banner, cargo_version, cli_version};
