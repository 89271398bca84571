//! Analysis pipeline: static rules, optional AI review, merge + dedup.

pub mod ai;
pub mod static_rules;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::feedback::FeedbackItem;
use ai::{AiAnalyzer, AiConfig};
use static_rules::StaticAnalyzer;

/// Coordinator running both analyzers and merging their findings.
pub struct CodeAnalyzer {
    static_analyzer: StaticAnalyzer,
    ai_analyzer: AiAnalyzer,
}

impl CodeAnalyzer {
    /// Builds the coordinator; `ai_api_key: None` disables the AI stage.
    pub fn new(ai_api_key: Option<String>) -> Self {
        Self {
            static_analyzer: StaticAnalyzer::new(),
            ai_analyzer: AiAnalyzer::new(AiConfig::new(ai_api_key)),
        }
    }

    /// Builds the coordinator from an explicit AI configuration.
    pub fn with_ai_config(cfg: AiConfig) -> Self {
        Self {
            static_analyzer: StaticAnalyzer::new(),
            ai_analyzer: AiAnalyzer::new(cfg),
        }
    }

    /// Runs static analysis, then AI analysis, and deduplicates the merged
    /// findings. Static findings come first, so they win ties against AI
    /// findings reporting the same issue.
    pub async fn analyze_diff(&self, diff: &str) -> Vec<FeedbackItem> {
        debug!("Running static analysis");
        let mut feedback = self.static_analyzer.analyze(diff);

        if self.ai_analyzer.enabled() {
            debug!("Running AI analysis");
            feedback.extend(self.ai_analyzer.analyze(diff).await);
        } else {
            warn!("No AI API key provided, skipping AI analysis");
        }

        deduplicate(feedback)
    }
}

/// Drops items that repeat an earlier item's `line` and the first 100
/// characters of its `message`; first occurrence order is preserved.
pub fn deduplicate(feedback: Vec<FeedbackItem>) -> Vec<FeedbackItem> {
    let mut seen: HashSet<(Option<u64>, String)> = HashSet::new();
    let mut unique = Vec::with_capacity(feedback.len());

    for item in feedback {
        let prefix: String = item.message.chars().take(100).collect();
        if seen.insert((item.line, prefix)) {
            unique.push(item);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackKind;

    fn item(kind: FeedbackKind, message: &str, line: Option<u64>) -> FeedbackItem {
        FeedbackItem {
            kind,
            message: message.to_string(),
            line,
            code_snippet: None,
            suggestion: None,
            path: None,
        }
    }

    #[test]
    fn drops_same_line_same_message_prefix() {
        let long = "x".repeat(150);
        let items = vec![
            item(FeedbackKind::Warning, &long, Some(4)),
            item(FeedbackKind::Info, &format!("{}tail", "x".repeat(100)), Some(4)),
            item(FeedbackKind::Warning, &long, Some(5)),
        ];

        let unique = deduplicate(items);
        // The second item shares line 4 and the first 100 chars; line 5 stays.
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].kind, FeedbackKind::Warning);
        assert_eq!(unique[1].line, Some(5));
    }

    #[test]
    fn dedup_is_idempotent() {
        let items = vec![
            item(FeedbackKind::Error, "secret", Some(1)),
            item(FeedbackKind::Warning, "print", Some(2)),
            item(FeedbackKind::Error, "secret", Some(1)),
        ];

        let once = deduplicate(items);
        let twice = deduplicate(once.clone());

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.message, b.message);
            assert_eq!(a.line, b.line);
        }
    }

    #[test]
    fn first_occurrence_wins() {
        // Static findings are concatenated before AI findings, so a static
        // warning outlives an AI duplicate of the same line/message.
        let items = vec![
            item(FeedbackKind::Warning, "use logging", Some(3)),
            item(FeedbackKind::Suggestion, "use logging", Some(3)),
        ];

        let unique = deduplicate(items);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].kind, FeedbackKind::Warning);
    }

    #[test]
    fn distinct_lines_are_kept() {
        let items = vec![
            item(FeedbackKind::Info, "todo", Some(1)),
            item(FeedbackKind::Info, "todo", Some(2)),
            item(FeedbackKind::Info, "todo", None),
        ];
        assert_eq!(deduplicate(items).len(), 3);
    }
}
