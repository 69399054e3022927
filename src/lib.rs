pub mod config;
pub mod git;
pub mod hook;
pub mod normalize;
pub mod ollama;
pub mod pipeline;
pub mod prompt;

// Re-exports
pub use config::Settings;
pub use pipeline::Outcome;
