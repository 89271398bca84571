//! Pattern-based static checks over added diff lines.

use crate::feedback::{FeedbackItem, FeedbackKind};
use regex::Regex;
use tracing::debug;

/// One named rule with a fixed severity and message.
struct Rule {
    name: &'static str,
    pattern: Regex,
    kind: FeedbackKind,
    message: &'static str,
}

/// Stateless scanner with a fixed set of named regex rules.
pub struct StaticAnalyzer {
    rules: Vec<Rule>,
}

impl Default for StaticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticAnalyzer {
    /// Compiles the fixed rule set. The patterns are constant, so failure
    /// here would be a programming error.
    pub fn new() -> Self {
        let rules = vec![
            Rule {
                name: "print_statement",
                pattern: Regex::new(r"print\(").unwrap(),
                kind: FeedbackKind::Warning,
                message: "Consider using logging instead of print statements for production code",
            },
            Rule {
                name: "todo_comment",
                pattern: Regex::new(r"(TODO|FIXME)").unwrap(),
                kind: FeedbackKind::Info,
                message: "TODO/FIXME comment found - remember to address before merging",
            },
            Rule {
                name: "empty_except",
                pattern: Regex::new(r"except:\s*pass").unwrap(),
                kind: FeedbackKind::Warning,
                message: "Empty except clause found - consider specifying exception types",
            },
            Rule {
                name: "hardcoded_secret",
                pattern: Regex::new(r#"(?i)(password|secret|key|token)\s*=\s*['"][^'"]+['"]"#)
                    .unwrap(),
                kind: FeedbackKind::Error,
                message: "Potential hardcoded secret found - use environment variables instead",
            },
        ];

        Self { rules }
    }

    /// Scans the added lines of a unified diff.
    ///
    /// Only `+`-prefixed lines are inspected, excluding `+++` file headers.
    /// The reported `line` is the 1-based position of the line within the
    /// diff text, not the target file's own numbering. Multiple rules may
    /// fire on the same line, producing multiple items.
    pub fn analyze(&self, diff: &str) -> Vec<FeedbackItem> {
        let mut feedback = Vec::new();

        for (i, line) in diff.lines().enumerate() {
            if !line.starts_with('+') || line.starts_with("+++") {
                continue;
            }
            let code = line[1..].trim();

            for rule in &self.rules {
                if rule.pattern.is_match(code) {
                    debug!("static rule fired: {} at diff line {}", rule.name, i + 1);
                    feedback.push(FeedbackItem {
                        kind: rule.kind,
                        message: rule.message.to_string(),
                        line: Some((i + 1) as u64),
                        code_snippet: Some(code.to_string()),
                        suggestion: None,
                        path: None,
                    });
                }
            }
        }

        feedback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_hardcoded_secret_as_single_error() {
        let diff = "--- a/app.py\n+++ b/app.py\n+  password = \"abc123\"\n";
        let feedback = StaticAnalyzer::new().analyze(diff);

        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].kind, FeedbackKind::Error);
        assert_eq!(feedback[0].line, Some(3));
    }

    #[test]
    fn flags_print_statement_as_single_warning() {
        let diff = "+++ b/app.py\n+  print(\"debug\")\n";
        let feedback = StaticAnalyzer::new().analyze(diff);

        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].kind, FeedbackKind::Warning);
        assert_eq!(feedback[0].line, Some(2));
    }

    #[test]
    fn ignores_file_headers_removed_and_context_lines() {
        let diff = concat!(
            "--- a/TODO.py\n",
            "+++ b/TODO.py\n",
            "-print(\"old\")\n",
            " print(\"context\")\n",
        );
        assert!(StaticAnalyzer::new().analyze(diff).is_empty());
    }

    #[test]
    fn one_line_can_fire_multiple_rules() {
        let diff = "+secret = \"x\"  # TODO rotate\n";
        let feedback = StaticAnalyzer::new().analyze(diff);

        assert_eq!(feedback.len(), 2);
        assert!(feedback.iter().any(|f| f.kind == FeedbackKind::Error));
        assert!(feedback.iter().any(|f| f.kind == FeedbackKind::Info));
        assert!(feedback.iter().all(|f| f.line == Some(1)));
    }

    #[test]
    fn snippet_carries_trimmed_added_code() {
        let diff = "+    print(\"x\")\n";
        let feedback = StaticAnalyzer::new().analyze(diff);
        assert_eq!(feedback[0].code_snippet.as_deref(), Some("print(\"x\")"));
    }
}
