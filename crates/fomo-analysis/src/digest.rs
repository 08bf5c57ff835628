//! Prompt construction and digest parsing for the generation model.
//!
//! The model is asked for a JSON object with `facts` and `opinions` arrays.
//! Replies are parsed leniently (raw JSON, a fenced code block, or the
//! outermost `{...}` span) and then checked against the expected shape before
//! being turned into a [`Digest`].

use std::fmt::Write as _;
use std::sync::LazyLock;

use fomo_core::Digest;
use regex::Regex;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::types::NewsMatch;

/// Articles shorter than this get a hint asking for fuller citations.
const SHORT_CONTENT_CHARS: usize = 200;

static OUTERMOST_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

const DIGEST_SHAPE: &str = r#"{
  "facts": [
    {
      "topic": "one sentence naming the concrete event",
      "summaries": [
        {
          "aspect": "core information or a related detail",
          "content": "who did what, when, where, amounts, products and plans",
          "citations": [
            { "news_id": "the real news id", "content": "the full source passage supporting the content" }
          ]
        }
      ]
    }
  ],
  "opinions": [
    {
      "topic": "an assessment or forecast about a concrete event",
      "summaries": [
        {
          "aspect": "market or expert view",
          "content": "who holds the view and what they expect",
          "citations": [
            { "news_id": "the real news id", "content": "the full passage containing the view" }
          ]
        }
      ]
    }
  ]
}"#;

/// The semantic-search query text for a company.
#[must_use]
pub fn company_query(company_name: &str) -> String {
    format!("{company_name} latest news, earnings, share price and market developments")
}

/// Render retrieved articles as the evidence block of the digest prompt.
#[must_use]
pub fn format_news(matches: &[NewsMatch]) -> String {
    let mut out = String::new();
    for m in matches {
        let content = m.content().unwrap_or("(no content)");
        let _ = writeln!(out, "===== News ID: {} =====", m.news_id());
        let _ = writeln!(out, "Title: {}", m.title().unwrap_or("(untitled)"));
        let _ = writeln!(out, "Published: {}", m.published_at().unwrap_or("unknown"));
        let _ = writeln!(out, "Source: {}", m.source().unwrap_or("unknown"));
        let _ = writeln!(out, "URL: {}", m.url().unwrap_or(""));
        let _ = writeln!(out, "Content: {content}");
        if content.chars().count() < SHORT_CONTENT_CHARS {
            let _ = writeln!(
                out,
                "[Note: this article is short; quote it with its full context when citing.]"
            );
        }
        out.push_str("==================\n\n");
    }
    out
}

/// Build the digest prompt for one company.
#[must_use]
pub fn build_digest_prompt(company_name: &str, matches: &[NewsMatch]) -> String {
    format!(
        "Analyze the following recent news about {company_name} and extract the concrete events.\n\
         \n\
         Requirements:\n\
         1. Each topic names a specific event so a reader immediately knows what happened, not a broad category.\n\
         2. Each aspect focuses on a specific detail of the event.\n\
         3. Content includes the concrete people, dates, places, amounts and products involved.\n\
         4. Citations carry enough original text to support every key point in the content.\n\
         5. Stay objective and grounded in the articles. Use the real news ids shown below.\n\
         6. Write the digest in the language of the articles.\n\
         \n\
         {news}\n\
         Reply with JSON only, in exactly this shape:\n\
         \n\
         {DIGEST_SHAPE}\n",
        news = format_news(matches),
    )
}

/// Build the prompt asking the model to repair a malformed reply.
#[must_use]
pub fn build_repair_prompt(malformed: &str) -> String {
    format!(
        "Repair the following text so that it is valid JSON.\n\
         \n\
         Original text:\n\
         {malformed}\n\
         \n\
         Requirements:\n\
         1. Return only the repaired JSON with no other text.\n\
         2. Keep the original content and fix only the format.\n\
         3. The object must contain both a \"facts\" and an \"opinions\" array; use empty arrays if missing.\n\
         \n\
         Expected shape:\n\
         {DIGEST_SHAPE}\n"
    )
}

/// Extract a JSON value from a model reply.
///
/// Tries, in order: the raw text, the text with a surrounding code fence
/// removed, and the outermost `{...}` span.
#[must_use]
pub fn extract_json(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    let cleaned = strip_code_fence(text);
    if let Ok(value) = serde_json::from_str(cleaned) {
        return Some(value);
    }

    OUTERMOST_OBJECT
        .find(cleaned)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Check that a value has the digest shape, naming the first offending path.
///
/// # Errors
///
/// Returns a description of the first structural problem found.
pub fn validate_structure(value: &Value) -> Result<(), String> {
    let root = value.as_object().ok_or("reply is not a JSON object")?;
    for section in ["facts", "opinions"] {
        let topics = root
            .get(section)
            .ok_or_else(|| format!("missing `{section}`"))?
            .as_array()
            .ok_or_else(|| format!("`{section}` is not an array"))?;
        for (t, topic) in topics.iter().enumerate() {
            let path = format!("{section}[{t}]");
            let summaries = require_keys(topic, &path, &["topic", "summaries"])?
                .get("summaries")
                .and_then(Value::as_array)
                .ok_or_else(|| format!("{path}.summaries is not an array"))?;
            for (s, summary) in summaries.iter().enumerate() {
                let path = format!("{path}.summaries[{s}]");
                let citations = require_keys(summary, &path, &["aspect", "content", "citations"])?
                    .get("citations")
                    .and_then(Value::as_array)
                    .ok_or_else(|| format!("{path}.citations is not an array"))?;
                for (c, citation) in citations.iter().enumerate() {
                    require_keys(
                        citation,
                        &format!("{path}.citations[{c}]"),
                        &["news_id", "content"],
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn require_keys<'a>(
    value: &'a Value,
    path: &str,
    keys: &[&str],
) -> Result<&'a serde_json::Map<String, Value>, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("{path} is not an object"))?;
    if let Some(missing) = keys.iter().find(|k| !object.contains_key(**k)) {
        return Err(format!("{path} is missing `{missing}`"));
    }
    Ok(object)
}

/// Parse and validate a model reply into a [`Digest`].
///
/// Numeric news ids are accepted and converted to strings.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidDigest`] if no JSON can be extracted or the
/// JSON does not have the digest shape.
pub fn parse_digest(text: &str) -> Result<Digest, AnalysisError> {
    let mut value = extract_json(text)
        .ok_or_else(|| AnalysisError::InvalidDigest("no JSON object in reply".into()))?;
    validate_structure(&value).map_err(AnalysisError::InvalidDigest)?;
    stringify_news_ids(&mut value);
    serde_json::from_value(value).map_err(|e| AnalysisError::InvalidDigest(e.to_string()))
}

fn stringify_news_ids(value: &mut Value) {
    for section in ["facts", "opinions"] {
        let Some(topics) = value.get_mut(section).and_then(Value::as_array_mut) else {
            continue;
        };
        let citations = topics
            .iter_mut()
            .filter_map(|t| t.get_mut("summaries").and_then(Value::as_array_mut))
            .flatten()
            .filter_map(|s| s.get_mut("citations").and_then(Value::as_array_mut))
            .flatten();
        for citation in citations {
            if let Some(Value::Number(n)) = citation.get("news_id") {
                let id = n.to_string();
                citation["news_id"] = Value::String(id);
            }
        }
    }
}

#[cfg(test)]
#[path = "digest_test.rs"]
mod tests;
