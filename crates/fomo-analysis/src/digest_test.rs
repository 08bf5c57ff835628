use super::*;

const VALID: &str = r#"{
  "facts": [
    {
      "topic": "Acme signs supply deal",
      "summaries": [
        {
          "aspect": "core",
          "content": "Acme agreed a two-year deal worth $40m.",
          "citations": [{ "news_id": "n-1", "content": "Acme said on Monday..." }]
        }
      ]
    }
  ],
  "opinions": []
}"#;

fn news_match(metadata: serde_json::Value) -> NewsMatch {
    serde_json::from_value(serde_json::json!({
        "id": "vec-1",
        "score": 0.9,
        "metadata": metadata,
    }))
    .unwrap()
}

#[test]
fn parses_plain_json() {
    let digest = parse_digest(VALID).unwrap();
    assert_eq!(digest.facts.len(), 1);
    assert_eq!(digest.facts[0].topic, "Acme signs supply deal");
    assert_eq!(digest.facts[0].summaries[0].citations[0].news_id, "n-1");
    assert!(digest.opinions.is_empty());
}

#[test]
fn parses_fenced_json() {
    let fenced = format!("```json\n{VALID}\n```");
    assert!(parse_digest(&fenced).is_ok());

    let bare_fence = format!("```\n{VALID}\n```");
    assert!(parse_digest(&bare_fence).is_ok());
}

#[test]
fn parses_json_surrounded_by_prose() {
    let chatty = format!("Here is the analysis you asked for:\n{VALID}\nLet me know!");
    let digest = parse_digest(&chatty).unwrap();
    assert_eq!(digest.facts.len(), 1);
}

#[test]
fn numeric_news_ids_become_strings() {
    let text = r#"{"facts":[{"topic":"t","summaries":[{"aspect":"a","content":"c",
        "citations":[{"news_id":42,"content":"q"}]}]}],"opinions":[]}"#;
    let digest = parse_digest(text).unwrap();
    assert_eq!(digest.facts[0].summaries[0].citations[0].news_id, "42");
}

#[test]
fn rejects_text_without_json() {
    let err = parse_digest("I could not find any news.").unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidDigest(_)));
    assert!(extract_json("   ").is_none());
}

#[test]
fn rejects_missing_opinions() {
    let err = parse_digest(r#"{"facts": []}"#).unwrap_err();
    assert!(err.to_string().contains("opinions"), "{err}");
}

#[test]
fn validation_names_the_offending_path() {
    let value = serde_json::json!({
        "facts": [{ "topic": "t", "summaries": [{ "aspect": "a", "content": "c" }] }],
        "opinions": []
    });
    let err = validate_structure(&value).unwrap_err();
    assert_eq!(err, "facts[0].summaries[0] is missing `citations`");
}

#[test]
fn validation_checks_citation_fields() {
    let value = serde_json::json!({
        "facts": [],
        "opinions": [{ "topic": "t", "summaries": [{
            "aspect": "a", "content": "c", "citations": [{ "content": "q" }]
        }]}]
    });
    let err = validate_structure(&value).unwrap_err();
    assert_eq!(err, "opinions[0].summaries[0].citations[0] is missing `news_id`");
}

#[test]
fn company_query_names_the_company() {
    let query = company_query("Acme");
    assert!(query.starts_with("Acme "));
    assert!(query.contains("news"));
}

#[test]
fn short_articles_get_a_citation_hint() {
    let short = news_match(serde_json::json!({ "news_id": "n-1", "text": "Brief." }));
    let long = news_match(serde_json::json!({ "news_id": "n-2", "text": "x".repeat(250) }));

    assert!(format_news(&[short]).contains("[Note: this article is short"));
    assert!(!format_news(&[long]).contains("[Note:"));
}

#[test]
fn formatted_news_uses_fallback_metadata_keys() {
    let m = news_match(serde_json::json!({
        "news_id": "n-7",
        "title": "Plain title",
        "url": "https://example.com/7",
        "content": "Body text",
    }));
    let out = format_news(&[m]);
    assert!(out.contains("===== News ID: n-7 ====="));
    assert!(out.contains("Title: Plain title"));
    assert!(out.contains("URL: https://example.com/7"));
    assert!(out.contains("Content: Body text"));
    assert!(out.contains("Source: unknown"));
}

#[test]
fn digest_prompt_embeds_company_and_news() {
    let m = news_match(serde_json::json!({ "news_id": "n-3", "article_title": "Headline" }));
    let prompt = build_digest_prompt("Acme", &[m]);
    assert!(prompt.contains("news about Acme"));
    assert!(prompt.contains("News ID: n-3"));
    assert!(prompt.contains("\"opinions\""));
}

#[test]
fn repair_prompt_includes_malformed_text() {
    let prompt = build_repair_prompt("{facts: [");
    assert!(prompt.contains("{facts: ["));
    assert!(prompt.contains("Return only the repaired JSON"));
}
