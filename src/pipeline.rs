//! The two-stage summarize-then-style pipeline.
//!
//! Stages run strictly in sequence: probe, diff, summarize (bounded retries),
//! style, post-process. Supplying `--load-summary` short-circuits everything
//! before the styling stage, including the availability probe.

use std::fs;

use log::{info, warn};
use thiserror::Error;

use crate::config::Settings;
use crate::git::{DiffSource, GitError};
use crate::ollama::{Backend, GenerateRequest, OllamaError};
use crate::prompt;

const SUMMARIZER_ATTEMPTS: u32 = 2;

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("{0}")]
  Probe(#[source] OllamaError),

  #[error("failed to read git diff: {0}")]
  Diff(#[from] GitError),

  #[error("could not load summary from {path}: {source}")]
  LoadSummary {
    path:   String,
    #[source]
    source: std::io::Error
  },

  #[error("summarizer failed after {attempts} attempts: {source}")]
  SummarizerExhausted {
    attempts: u32,
    #[source]
    source:   OllamaError
  },

  #[error("styling model failed: {0}")]
  Style(#[source] OllamaError)
}

impl PipelineError {
  /// Exit code for the failed stage, so calling scripts can branch on the
  /// failure cause.
  pub fn exit_code(&self) -> i32 {
    match self {
      PipelineError::Probe(_) => 1,
      PipelineError::Diff(_) | PipelineError::LoadSummary { .. } => 2,
      PipelineError::SummarizerExhausted { .. } => 3,
      PipelineError::Style(_) => 4
    }
  }
}

/// Final styled message plus the factual summary it was derived from, kept
/// around for any secondary persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
  pub message: String,
  pub summary: String
}

pub async fn run(settings: &Settings, backend: &dyn Backend, diffs: &dyn DiffSource) -> Result<Outcome, PipelineError> {
  let summary = match &settings.load_summary {
    Some(path) => {
      info!("Loading summary from {}", path.display());
      let summary = fs::read_to_string(path).map_err(|source| {
        PipelineError::LoadSummary { path: path.display().to_string(), source }
      })?;
      info!("Summary loaded ({} bytes)", summary.len());
      summary
    }
    None => summarize(settings, backend, diffs).await?
  };

  info!("Calling style model '{}' with tone: {}", settings.style_model, settings.tone);
  let request = GenerateRequest::new(&settings.style_model, prompt::style_prompt(&settings.tone, &summary))
    .option("temperature", 0.9);
  let message = backend.generate(&request).await.map_err(PipelineError::Style)?;
  info!("Final message generated");

  let mut message = message.trim().to_string();
  if settings.no_labels {
    message = strip_labels(&message);
  }

  Ok(Outcome { message, summary })
}

/// Normal-flow summary production: probe, diff, then a bounded retry loop
/// around the summarizer call. The first non-error result is accepted as-is;
/// the retry budget is attempt-counted, not shape-validated.
async fn summarize(settings: &Settings, backend: &dyn Backend, diffs: &dyn DiffSource) -> Result<String, PipelineError> {
  info!("Checking Ollama availability at {}", settings.ollama_url);
  backend.probe().await.map_err(PipelineError::Probe)?;
  info!("Ollama reachable");

  info!("Gathering git diff (staged or unstaged)");
  let diff = diffs.diff().await?;
  info!("Diff collected ({} bytes)", diff.len());

  let request = GenerateRequest::new(&settings.summarizer_model, prompt::summary_prompt(&diff))
    .option("temperature", 0.0);

  info!("Calling summarizer model '{}'", settings.summarizer_model);
  let mut attempt = 1;
  let summary = loop {
    match backend.generate(&request).await {
      Ok(summary) => {
        info!("Summary received (attempt {attempt})");
        break summary;
      }
      Err(err) if attempt < SUMMARIZER_ATTEMPTS => {
        warn!("summarizer call error (attempt {attempt}): {err}");
        attempt += 1;
      }
      Err(err) => {
        warn!("summarizer call error (attempt {attempt}): {err}");
        return Err(PipelineError::SummarizerExhausted { attempts: SUMMARIZER_ATTEMPTS, source: err });
      }
    }
  };

  if let Some(path) = &settings.save_summary {
    info!("Saving summary to {}", path.display());
    // The only recoverable failure in the pipeline: warn and keep going.
    match fs::write(path, &summary) {
      Ok(()) => info!("Summary saved successfully"),
      Err(err) => warn!("failed to save summary to {}: {err}", path.display())
    }
  }

  Ok(summary)
}

/// Removes recognized `Title:` / `Body:` prefixes (case-insensitive) from
/// each line; other lines and the newline structure are left untouched.
pub fn strip_labels(message: &str) -> String {
  message
    .split('\n')
    .map(|line| {
      let trimmed = line.trim();
      strip_prefix_ci(trimmed, "title:")
        .or_else(|| strip_prefix_ci(trimmed, "body:"))
        .map(|rest| rest.trim().to_string())
        .unwrap_or_else(|| line.to_string())
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
  if line.len() >= prefix.len() && line.is_char_boundary(prefix.len()) && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
    Some(&line[prefix.len()..])
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_recognized_labels_only() {
    let input = "Title: Fix bug\nBody: details\nExtra: info";
    assert_eq!(strip_labels(input), "Fix bug\ndetails\nExtra: info");
  }

  #[test]
  fn strips_labels_case_insensitively() {
    assert_eq!(strip_labels("TITLE: Fix bug\nbody: details"), "Fix bug\ndetails");
  }

  #[test]
  fn preserves_blank_lines_and_unlabelled_text() {
    let input = "Title: Fix bug\n\nplain line\n";
    assert_eq!(strip_labels(input), "Fix bug\n\nplain line\n");
  }

  #[test]
  fn handles_multibyte_lines_without_panicking() {
    assert_eq!(strip_labels("héllo"), "héllo");
    assert_eq!(strip_labels("ü"), "ü");
  }
}
