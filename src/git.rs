use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum GitError {
  #[error("`git {args}` failed: {output}")]
  Process { args: String, output: String },

  #[error("failed to run git: {0}")]
  Io(#[from] std::io::Error)
}

trait Utf8String {
  fn to_utf8(&self) -> String;
}

impl Utf8String for [u8] {
  fn to_utf8(&self) -> String {
    String::from_utf8_lossy(self).into_owned()
  }
}

/// Seam for diff acquisition so the pipeline can be driven against mocks.
#[async_trait]
pub trait DiffSource: Send + Sync {
  async fn diff(&self) -> Result<String, GitError>;
}

/// Obtains a unified diff by shelling out to `git`, preferring the staged
/// diff and falling back to the unstaged one when the index is clean.
#[derive(Debug, Default)]
pub struct GitDiff {
  dir: Option<PathBuf>
}

impl GitDiff {
  pub fn new() -> Self {
    Self::default()
  }

  /// Runs git in `dir` instead of the current working directory.
  pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
    Self { dir: Some(dir.into()) }
  }

  async fn run_diff(&self, args: &[&str]) -> Result<String, GitError> {
    debug!("[git] git {}", args.join(" "));
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = &self.dir {
      cmd.current_dir(dir);
    }
    let output = cmd.output().await?;

    if !output.status.success() {
      let combined = [output.stdout.as_slice(), output.stderr.as_slice()].concat();
      return Err(GitError::Process {
        args:   args.join(" "),
        output: combined.to_utf8()
      });
    }

    Ok(output.stdout.to_utf8())
  }
}

#[async_trait]
impl DiffSource for GitDiff {
  async fn diff(&self) -> Result<String, GitError> {
    let staged = self.run_diff(&["diff", "--staged"]).await?;
    if !staged.trim().is_empty() {
      return Ok(staged);
    }
    // Both diffs being empty is fine; the caller decides what to do with it.
    self.run_diff(&["diff"]).await
  }
}
