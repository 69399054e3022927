//! Cleanup for raw model output before it is shown or reused.
//!
//! Models frequently wrap commit messages in code fences or return the whole
//! body as a quoted string literal. `clean_model_output` undoes both, is total
//! (never fails) and idempotent.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
  static ref FENCE_RE: Regex = Regex::new(r"(?s)```[a-zA-Z0-9_-]*\n(.*?)```").expect("fence regex is valid");
}

/// Normalizes model text: unquotes a fully-quoted body, strips code fences
/// and stray fence markers, and normalizes CRLF line endings.
pub fn clean_model_output(raw: &str) -> String {
  let mut text = raw.trim().to_string();

  // If the entire body is a quoted string like "...\n...", try to unquote it.
  if let Some(unquoted) = unquote(&text) {
    text = unquoted;
  }

  // Replace any ```lang\n...``` occurrences with the inner text.
  if FENCE_RE.is_match(&text) {
    text = FENCE_RE.replace_all(&text, "$1").into_owned();
  }
  // Also remove any remaining ``` markers
  text = text.replace("```", "");

  text = text.replace("\r\n", "\n");

  text.trim().to_string()
}

/// Attempts to decode `text` as one quoted string literal. Returns `None`
/// when the input is not wrapped in a matching pair of quotes or cannot be
/// unescaped, in which case the caller keeps the input unchanged.
fn unquote(text: &str) -> Option<String> {
  let bytes = text.as_bytes();
  if bytes.len() < 2 {
    return None;
  }

  match (bytes[0], bytes[bytes.len() - 1]) {
    // Double-quoted bodies follow JSON string escaping; serde_json rejects
    // trailing garbage, so partial quotes fall through untouched.
    (b'"', b'"') => serde_json::from_str::<String>(text).ok(),
    // Single-quoted bodies only round-trip unambiguously when escape-free.
    (b'\'', b'\'') => {
      let inner = &text[1..text.len() - 1];
      if inner.contains(['\'', '"', '\\']) {
        None
      } else {
        Some(inner.to_string())
      }
    }
    _ => None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unquotes_json_string_with_embedded_newline() {
    assert_eq!(clean_model_output(r#""hello\nworld""#), "hello\nworld");
  }

  #[test]
  fn leaves_partially_quoted_text_alone() {
    assert_eq!(clean_model_output(r#""a" and "b""#), r#""a" and "b""#);
  }

  #[test]
  fn unquotes_plain_single_quoted_text() {
    assert_eq!(clean_model_output("'fix the parser'"), "fix the parser");
  }

  #[test]
  fn keeps_single_quoted_text_with_escapes() {
    assert_eq!(clean_model_output(r"'it\'s'"), r"'it\'s'");
  }

  #[test]
  fn strips_fenced_code_block() {
    assert_eq!(clean_model_output("```go\nfunc f(){}\n```"), "func f(){}");
  }

  #[test]
  fn strips_multiple_fenced_blocks() {
    let input = "before\n```rust\nfn a() {}\n```\nmiddle\n```\nfn b() {}\n```\nafter";
    assert_eq!(clean_model_output(input), "before\nfn a() {}\n\nmiddle\nfn b() {}\n\nafter");
  }

  #[test]
  fn removes_stray_fence_markers() {
    assert_eq!(clean_model_output("fix things```"), "fix things");
  }

  #[test]
  fn normalizes_crlf() {
    assert_eq!(clean_model_output("title\r\n\r\nbody"), "title\n\nbody");
  }

  #[test]
  fn is_idempotent() {
    let inputs = [
      "plain text",
      r#""hello\nworld""#,
      "```go\nfunc f(){}\n```",
      "'quoted'",
      "a\r\nb```",
      "  padded  ",
      "",
      "\"",
      "''",
    ];
    for input in inputs {
      let once = clean_model_output(input);
      assert_eq!(clean_model_output(&once), once, "not idempotent for {input:?}");
    }
  }
}
