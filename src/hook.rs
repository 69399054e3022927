//! Writes the final message to the commit-message (hook) file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::info;
use thiserror::Error;

/// Comment line separating an existing commit message from the appended
/// suggestion, so the hook file stays usable in the commit editor.
pub const APPEND_HEADER: &str = "# Suggested commit message (auto-generated):";

#[derive(Error, Debug)]
pub enum HookError {
  #[error("failed to open hook file for append: {0}")]
  Open(#[source] std::io::Error),

  #[error("failed to write to hook file: {0}")]
  Append(#[source] std::io::Error),

  #[error("failed to write hook file: {0}")]
  Write(#[source] std::io::Error)
}

impl HookError {
  /// Exit code for the failed operation, so calling scripts can branch on
  /// the failure cause.
  pub fn exit_code(&self) -> i32 {
    match self {
      HookError::Open(_) => 5,
      HookError::Append(_) => 6,
      HookError::Write(_) => 7
    }
  }
}

/// Persists `message` to `path`. A missing file (or `overwrite`) replaces the
/// content; an existing file gets the message appended after a delimiter
/// comment, never truncating what was already there.
pub fn persist(path: &Path, message: &str, overwrite: bool) -> Result<(), HookError> {
  if path.exists() && !overwrite {
    info!("Appending suggested message to {}", path.display());
    let mut file = OpenOptions::new().append(true).open(path).map_err(HookError::Open)?;
    file
      .write_all(format!("\n{APPEND_HEADER}\n{message}\n").as_bytes())
      .map_err(HookError::Append)?;
  } else {
    info!("Writing suggested message to {}", path.display());
    fs::write(path, format!("{message}\n")).map_err(HookError::Write)?;
  }
  Ok(())
}
