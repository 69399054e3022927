use std::process;

use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use env_logger::Env;
use log::{debug, info};
use tone::config::{Args, Settings};
use tone::git::GitDiff;
use tone::ollama::OllamaClient;
use tone::{hook, pipeline};

#[tokio::main]
async fn main() {
  dotenv().ok();
  let settings = Settings::from_args(Args::parse());

  // Progress and diagnostics go to stderr via the logger; stdout carries
  // only the final message.
  let default_filter = if settings.debug { "debug" } else { "info" };
  env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
  debug!("settings: {settings:?}");

  let client = match OllamaClient::new(&settings.ollama_url, settings.timeout()) {
    Ok(client) => client,
    Err(err) => fail(&err.to_string(), 1)
  };

  let outcome = match pipeline::run(&settings, &client, &GitDiff::new()).await {
    Ok(outcome) => outcome,
    Err(err) => fail(&err.to_string(), err.exit_code())
  };

  println!("{}", outcome.message);

  if let Some(path) = &settings.hook_file {
    if let Err(err) = hook::persist(path, &outcome.message, settings.force) {
      fail(&err.to_string(), err.exit_code());
    }
    info!("Hook file updated: {}", path.display());
  }
  info!("Done");
}

fn fail(message: &str, code: i32) -> ! {
  eprintln!("{} {message}", "error:".bold().bright_red());
  process::exit(code);
}
