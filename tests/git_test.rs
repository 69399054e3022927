use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use tone::git::{DiffSource, GitDiff, GitError};

fn git(dir: &Path, args: &[&str]) {
  let output = Command::new("git")
    .args(args)
    .current_dir(dir)
    .output()
    .expect("failed to run git");
  assert!(output.status.success(), "git {args:?} failed: {}", String::from_utf8_lossy(&output.stderr));
}

fn init_repo() -> TempDir {
  let dir = TempDir::new().unwrap();
  git(dir.path(), &["init"]);
  git(dir.path(), &["config", "user.email", "test@example.com"]);
  git(dir.path(), &["config", "user.name", "Test"]);
  fs::write(dir.path().join("file.txt"), "one\n").unwrap();
  git(dir.path(), &["add", "."]);
  git(dir.path(), &["commit", "-m", "initial"]);
  dir
}

#[tokio::test]
async fn clean_repo_yields_empty_diff() {
  let repo = init_repo();
  let diff = GitDiff::in_dir(repo.path()).diff().await.unwrap();
  assert_eq!(diff.trim(), "");
}

#[tokio::test]
async fn prefers_the_staged_diff() {
  let repo = init_repo();
  fs::write(repo.path().join("file.txt"), "two\n").unwrap();
  git(repo.path(), &["add", "."]);

  let diff = GitDiff::in_dir(repo.path()).diff().await.unwrap();
  assert!(diff.contains("-one"));
  assert!(diff.contains("+two"));
}

#[tokio::test]
async fn falls_back_to_the_unstaged_diff() {
  let repo = init_repo();
  fs::write(repo.path().join("file.txt"), "three\n").unwrap();

  let diff = GitDiff::in_dir(repo.path()).diff().await.unwrap();
  assert!(diff.contains("+three"));
}

#[tokio::test]
async fn outside_a_repository_is_a_process_error() {
  let dir = TempDir::new().unwrap();
  let err = GitDiff::in_dir(dir.path()).diff().await.unwrap_err();
  match err {
    GitError::Process { args, output } => {
      assert_eq!(args, "diff --staged");
      assert!(output.contains("not a git repository"));
    }
    other => panic!("expected process error, got {other:?}")
  }
}
