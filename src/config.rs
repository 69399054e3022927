use std::env;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Parser, Debug)]
#[clap(name = "git-tone", version, about = "Turns your staged diff into a styled commit message via a local two-stage Ollama pipeline")]
pub struct Args {
  /// Ollama generate endpoint (falls back to $OLLAMA_URL)
  #[clap(long = "ollama", value_name = "URL")]
  pub ollama_url: Option<String>,

  /// Model for the factual summary stage
  #[clap(long = "summ-model", default_value = "gemma3:4B", value_name = "MODEL")]
  pub summarizer_model: String,

  /// Model for the stylistic rewrite stage
  #[clap(long = "style-model", default_value = "mistral:7b", value_name = "MODEL")]
  pub style_model: String,

  /// Tone for the stylistic rewrite
  #[clap(long, default_value = "chaotic, wild, funny")]
  pub tone: String,

  /// Path to the git hook commit message file
  #[clap(long = "hook", value_name = "FILE")]
  pub hook_file: Option<PathBuf>,

  /// Overwrite an existing commit message in the hook file
  #[clap(long)]
  pub force: bool,

  /// Enable debug logging
  #[clap(long)]
  pub debug: bool,

  /// Remove Title:/Body: labels from the output
  #[clap(long = "no-labels")]
  pub no_labels: bool,

  /// Save the factual summary to a file (for review or reuse)
  #[clap(long = "save-summary", value_name = "FILE")]
  pub save_summary: Option<PathBuf>,

  /// Load the summary from a file and skip the summarizer stage
  #[clap(long = "load-summary", value_name = "FILE")]
  pub load_summary: Option<PathBuf>,

  /// Request timeout for generation calls, in seconds
  #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_name = "SECS")]
  pub timeout: u64
}

/// Resolved runtime configuration, built once at startup and passed into the
/// pipeline. There is no process-global state.
#[derive(Debug, Clone)]
pub struct Settings {
  pub ollama_url:       String,
  pub summarizer_model: String,
  pub style_model:      String,
  pub tone:             String,
  pub hook_file:        Option<PathBuf>,
  pub force:            bool,
  pub debug:            bool,
  pub no_labels:        bool,
  pub save_summary:     Option<PathBuf>,
  pub load_summary:     Option<PathBuf>,
  pub timeout_secs:     u64
}

impl Settings {
  /// Resolves flags against the environment: `--ollama` wins, then
  /// `$OLLAMA_URL`, then the local default endpoint.
  pub fn from_args(args: Args) -> Self {
    let ollama_url = args
      .ollama_url
      .or_else(|| env::var("OLLAMA_URL").ok().filter(|url| !url.is_empty()))
      .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

    Self {
      ollama_url,
      summarizer_model: args.summarizer_model,
      style_model: args.style_model,
      tone: args.tone,
      hook_file: args.hook_file,
      force: args.force,
      debug: args.debug,
      no_labels: args.no_labels,
      save_summary: args.save_summary,
      load_summary: args.load_summary,
      timeout_secs: args.timeout
    }
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}
