//! Structured analysis results returned by an [`crate::Analyzer`].

use serde::{Deserialize, Serialize};

/// How an analysis call concluded. All three are successful completions from
/// the gate's point of view; failures are reported as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// A digest was produced from retrieved news.
    Success,
    /// No news mentioned the company inside the lookback window.
    NoNews,
    /// News ids were found but the vector index held no matching content.
    NoVectorData,
}

/// A citation backing one summary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub news_id: String,
    pub content: String,
}

/// One aspect of a topic, with its supporting citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub aspect: String,
    pub content: String,
    pub citations: Vec<Citation>,
}

/// A topic (a concrete news event or an opinion about one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub topic: String,
    pub summaries: Vec<Summary>,
}

/// The model-produced digest for one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub facts: Vec<Topic>,
    pub opinions: Vec<Topic>,
}

impl Digest {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.opinions.is_empty()
    }
}

/// A news source referenced by the digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub news_id: String,
    pub title: String,
    pub source: String,
    pub published_at: String,
    pub url: String,
    /// Similarity score from the vector index, rounded to three decimals.
    pub score: f64,
}

/// Output of one company's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub status: ReportStatus,
    /// Number of news items found for the company in the window.
    pub news_count: usize,
    pub digest: Option<Digest>,
    pub sources: Vec<SourceRef>,
    pub time_range_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalysisReport {
    /// Report for a company with nothing to analyze in the window.
    #[must_use]
    pub fn no_news(time_range_hours: u32) -> Self {
        Self {
            status: ReportStatus::NoNews,
            news_count: 0,
            digest: None,
            sources: Vec::new(),
            time_range_hours,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_news_report_is_empty() {
        let report = AnalysisReport::no_news(24);
        assert_eq!(report.status, ReportStatus::NoNews);
        assert_eq!(report.news_count, 0);
        assert!(report.digest.is_none());
        assert_eq!(report.time_range_hours, 24);
    }

    #[test]
    fn digest_deserializes_from_model_shape() {
        let raw = serde_json::json!({
            "facts": [{
                "topic": "Acme ships a new widget",
                "summaries": [{
                    "aspect": "launch",
                    "content": "Acme launched the widget on Monday",
                    "citations": [{"news_id": "n-1", "content": "Acme said on Monday..."}]
                }]
            }],
            "opinions": []
        });
        let digest: Digest = serde_json::from_value(raw).unwrap();
        assert_eq!(digest.facts.len(), 1);
        assert_eq!(digest.facts[0].summaries[0].citations[0].news_id, "n-1");
        assert!(!digest.is_empty());
    }
}
