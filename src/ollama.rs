use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::normalize::clean_model_output;

const PROBE_PATH: &str = "/api/tags";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Error, Debug)]
pub enum OllamaError {
  #[error("invalid ollama URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("failed to serialize request: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("ollama does not appear to be running at {url}; start it with 'ollama serve'")]
  Unreachable {
    url:    String,
    #[source]
    source: reqwest::Error
  },

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("ollama error: status={status} body={body}")]
  Status { status: u16, body: String },

  #[error("failed to decode response: {0}")]
  Decode(#[source] serde_json::Error)
}

/// One generation call to `/api/generate`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
  pub model:  String,
  pub prompt: String,
  pub stream: bool,
  #[serde(skip_serializing_if = "HashMap::is_empty")]
  pub options: HashMap<String, serde_json::Value>
}

impl GenerateRequest {
  pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
    Self {
      model:   model.into(),
      prompt:  prompt.into(),
      stream:  false,
      options: HashMap::new()
    }
  }

  pub fn option(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
    self.options.insert(name.to_string(), value.into());
    self
  }
}

/// One element of the newline-delimited response stream.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateChunk {
  #[serde(default)]
  pub model:      String,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub response:   String,
  #[serde(default)]
  pub done:       bool
}

/// Seam for the text-generation backend so the pipeline can be driven
/// against mocks in tests.
#[async_trait]
pub trait Backend: Send + Sync {
  async fn generate(&self, request: &GenerateRequest) -> Result<String, OllamaError>;
  async fn probe(&self) -> Result<(), OllamaError>;
}

pub struct OllamaClient {
  http: reqwest::Client,
  url:  Url
}

impl OllamaClient {
  /// Builds a client for the given generate endpoint with a bounded request
  /// timeout covering the whole call, stream consumption included.
  pub fn new(url: &str, timeout: Duration) -> Result<Self, OllamaError> {
    let url = Url::parse(url)?;
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { http, url })
  }
}

#[async_trait]
impl Backend for OllamaClient {
  async fn generate(&self, request: &GenerateRequest) -> Result<String, OllamaError> {
    let body = serde_json::to_vec(request).map_err(OllamaError::Serialize)?;
    debug!("[ollama] POST {} model={}", self.url, request.model);

    let response = self
      .http
      .post(self.url.clone())
      .header(CONTENT_TYPE, "application/json")
      .body(body)
      .send()
      .await?;

    let status = response.status();
    if status.as_u16() >= 400 {
      let body = response.text().await.unwrap_or_default();
      return Err(OllamaError::Status { status: status.as_u16(), body });
    }

    // The body is dropped (and the connection released) on every exit path,
    // including a decode failure halfway through the stream.
    let mut acc = StreamAccumulator::default();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
      acc.push(&chunk?)?;
    }
    let text = acc.finish()?;

    Ok(clean_model_output(&text))
  }

  async fn probe(&self) -> Result<(), OllamaError> {
    let mut url = self.url.clone();
    url.set_path(PROBE_PATH);
    debug!("[ollama] GET {url}");

    let response = self
      .http
      .get(url.clone())
      .timeout(PROBE_TIMEOUT)
      .send()
      .await
      .map_err(|source| OllamaError::Unreachable { url: url.to_string(), source })?;

    let status = response.status();
    if status.as_u16() >= 400 {
      let body = response.text().await.unwrap_or_default();
      return Err(OllamaError::Status { status: status.as_u16(), body: body.trim().to_string() });
    }

    Ok(())
  }
}

/// Incremental decoder for the newline-delimited JSON response stream.
/// Fragments are appended strictly in arrival order.
#[derive(Debug, Default)]
struct StreamAccumulator {
  buf:  Vec<u8>,
  text: String
}

impl StreamAccumulator {
  fn push(&mut self, chunk: &[u8]) -> Result<(), OllamaError> {
    self.buf.extend_from_slice(chunk);
    while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
      let line: Vec<u8> = self.buf.drain(..=pos).collect();
      self.decode(&line)?;
    }
    Ok(())
  }

  fn finish(mut self) -> Result<String, OllamaError> {
    // A final object without a trailing newline is still valid.
    if !self.buf.is_empty() {
      let rest = std::mem::take(&mut self.buf);
      self.decode(&rest)?;
    }
    Ok(self.text)
  }

  fn decode(&mut self, line: &[u8]) -> Result<(), OllamaError> {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
      return Ok(());
    }
    let chunk: GenerateChunk = serde_json::from_slice(line).map_err(OllamaError::Decode)?;
    if chunk.done {
      debug!("[ollama] stream done (model={})", chunk.model);
    }
    self.text.push_str(&chunk.response);
    Ok(())
  }
}
