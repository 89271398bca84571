//! Feedback model shared by both analyzers and the orchestrator.

use serde::{Deserialize, Serialize};

/// Severity/category of one reviewer finding.
///
/// The AI analyzer emits free-form type strings; anything outside the known
/// vocabulary lands on [`FeedbackKind::Other`] and scores like `info`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Error,
    Warning,
    Info,
    Suggestion,
    #[serde(other)]
    Other,
}

impl FeedbackKind {
    /// Score deduction for one finding of this kind.
    pub fn weight(&self) -> f64 {
        match self {
            FeedbackKind::Error => 5.0,
            FeedbackKind::Warning => 2.0,
            FeedbackKind::Info => 0.5,
            FeedbackKind::Suggestion => 0.2,
            FeedbackKind::Other => 0.5,
        }
    }

    /// Upper-case display tag, e.g. `ERROR`.
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackKind::Error => "ERROR",
            FeedbackKind::Warning => "WARNING",
            FeedbackKind::Info => "INFO",
            FeedbackKind::Suggestion => "SUGGESTION",
            FeedbackKind::Other => "OTHER",
        }
    }
}

/// One reviewer finding. Immutable once created.
///
/// `line`, when set by the static analyzer, is a 1-based offset into the
/// diff text, not the target file's own numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub code_snippet: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Terminal output of one review; not persisted.
#[derive(Debug, Serialize)]
pub struct ReviewResult {
    /// Raw provider PR object, opaque except for `title`.
    pub pr_details: serde_json::Value,
    pub feedback: Vec<FeedbackItem>,
    /// Quality score in [0, 100].
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_deserializes_to_other() {
        let item: FeedbackItem =
            serde_json::from_str(r#"{"type": "critical", "message": "boom"}"#).unwrap();
        assert_eq!(item.kind, FeedbackKind::Other);
        assert_eq!(item.kind.weight(), 0.5);
    }

    #[test]
    fn partial_item_fills_optionals_with_none() {
        let item: FeedbackItem =
            serde_json::from_str(r#"{"type": "warning", "message": "w"}"#).unwrap();
        assert!(item.line.is_none());
        assert!(item.code_snippet.is_none());
        assert!(item.suggestion.is_none());
        assert!(item.path.is_none());
    }
}
