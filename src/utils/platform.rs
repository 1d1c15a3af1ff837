//! Platform helpers for locating the external binaries we shell out to.

use anyhow::Result;

use crate::core::error::RepofetchError;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// The git command name for the current platform.
#[must_use]
pub const fn git_command() -> &'static str {
    if is_windows() { "git.exe" } else { "git" }
}

/// The rclone command name for the current platform.
#[must_use]
pub const fn rclone_command() -> &'static str {
    if is_windows() { "rclone.exe" } else { "rclone" }
}

/// Ensure `program` is on PATH, returning a structured error when missing so
/// the CLI can print an actionable message instead of a raw spawn failure.
pub fn require_binary(program: &str) -> Result<()> {
    which::which(program)
        .map(|_| ())
        .map_err(|_| RepofetchError::BinaryNotFound { name: program.to_string() }.into())
}
