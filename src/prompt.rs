//! Prompt templates for the two pipeline stages.

/// Fact-extraction prompt for the summarizer stage. Embeds the diff and a
/// strict output-format trailer; the model runs at temperature 0.
pub fn summary_prompt(diff: &str) -> String {
  format!(
    "Summarize the following git diff with strict factual accuracy.
Produce TWO sections:
1. A short commit title (max 60 chars)
2. A 3-40 line commit body describing the key changes.

Rules:
- Title should be imperative tense.
- Body should describe files, functions, and intent.
- Do NOT invent or hallucinate.
- Keep it concise.

Diff:
{diff}


OUTPUT FORMAT:
TITLE (one line)
BLANK LINE
BODY (2-4 lines)
"
  )
}

/// Restyling prompt for the styler stage. The summary's facts must survive
/// the rewrite; only the voice changes.
pub fn style_prompt(tone: &str, summary: &str) -> String {
  format!(
    "Rewrite the following commit (title + body) but:
- KEEP the factual content *exactly*.
- Apply this tone: {tone}
- Make it wild/funny/chaotic while readable.
- Maintain title + body structure.
- 1 title line, 2-40 body lines.

Original commit:
{summary}
"
  )
}
