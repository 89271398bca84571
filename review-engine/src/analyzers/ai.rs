//! LLM-based review of a unified diff.
//!
//! Thin client for the Gemini `generateContent` endpoint:
//! one prompt per `analyze` call, a bounded timeout, and best-effort
//! extraction of a JSON findings array from the model's free-form text.
//! Every failure mode degrades: no key means no call, transport/HTTP errors
//! yield an empty result, and an unparseable response yields exactly one
//! synthetic `info` item. AI analysis never aborts a review.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::feedback::{FeedbackItem, FeedbackKind};

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Configuration for the AI analyzer.
///
/// `api_key: None` disables the analyzer entirely.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Default generation parameters against the public Gemini endpoint.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.2,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
            timeout_secs: 30,
        }
    }
}

/// The model's reply could not be interpreted as a findings array.
#[derive(Debug, Error)]
pub enum AiResponseError {
    #[error("no JSON findings array in model response")]
    Unparseable,
}

/// LLM client over one configured endpoint.
pub struct AiAnalyzer {
    http: reqwest::Client,
    cfg: AiConfig,
}

impl AiAnalyzer {
    /// Builds the analyzer. The bounded timeout is applied per request.
    pub fn new(cfg: AiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cfg,
        }
    }

    /// Whether an API key is configured.
    pub fn enabled(&self) -> bool {
        self.cfg.api_key.is_some()
    }

    /// Reviews the diff with one LLM call.
    ///
    /// Returns an empty vec without any network traffic when no API key is
    /// configured, and on any transport or HTTP failure.
    pub async fn analyze(&self, diff: &str) -> Vec<FeedbackItem> {
        let Some(api_key) = self.cfg.api_key.as_deref() else {
            warn!("No AI API key provided, skipping AI analysis");
            return Vec::new();
        };

        let prompt = build_prompt(diff);
        let body = GenerateRequest::from_cfg(&self.cfg, &prompt);

        debug!("POST {}", self.cfg.endpoint);
        let resp = match self
            .http
            .post(&self.cfg.endpoint)
            .timeout(Duration::from_secs(self.cfg.timeout_secs))
            .header("Content-Type", "application/json")
            .header("X-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                error!("AI analysis request failed: {err}");
                return Vec::new();
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(240)
                .collect();
            error!("AI analysis returned status {status}: {snippet}");
            return Vec::new();
        }

        let out: GenerateResponse = match resp.json().await {
            Ok(out) => out,
            Err(err) => {
                error!("Failed to decode AI response envelope: {err}");
                return Vec::new();
            }
        };

        let Some(text) = out.first_text() else {
            warn!("AI response contained no candidates");
            return Vec::new();
        };

        match extract_findings(text.trim()) {
            Ok(items) => items,
            Err(err) => {
                error!("Failed to parse AI response: {err}");
                vec![FeedbackItem {
                    kind: FeedbackKind::Info,
                    message: "AI analysis completed but response format was unexpected"
                        .to_string(),
                    line: None,
                    code_snippet: None,
                    suggestion: Some("Check the AI response format".to_string()),
                    path: None,
                }]
            }
        }
    }
}

/// Builds the single review prompt embedding the full diff and the rubric.
fn build_prompt(diff: &str) -> String {
    format!(
        r#"You are an expert code reviewer. Analyze the following code changes from a pull request and provide specific, actionable feedback.

Focus on:
1. Code quality and readability
2. Potential bugs or logical errors
3. Security vulnerabilities
4. Performance issues
5. Adherence to best practices and coding standards
6. Error handling and edge cases

For each issue found, provide:
- Type (error, warning, info, or suggestion)
- A clear message explaining the issue
- The line number (if applicable)
- A code snippet showing the problematic code
- Suggested fix (if applicable)

Format your response as a valid JSON array of objects with these fields:
- type (string)
- message (string)
- line (number or null)
- code_snippet (string or null)
- suggestion (string or null)

Code changes (in unified diff format):
{diff}

Response (JSON only):
"#
    )
}

/// Locates and decodes the findings array within free-form model text.
///
/// First a bracket-matched JSON array substring, then the whole text as
/// JSON; failing both is a typed, recoverable outcome.
pub(crate) fn extract_findings(text: &str) -> Result<Vec<FeedbackItem>, AiResponseError> {
    let array_re = Regex::new(r"(?s)\[\s*\{.*\}\s*\]").unwrap();

    if let Some(m) = array_re.find(text) {
        if let Ok(items) = serde_json::from_str::<Vec<FeedbackItem>>(m.as_str()) {
            return Ok(items);
        }
    }

    serde_json::from_str::<Vec<FeedbackItem>>(text).map_err(|_| AiResponseError::Unparseable)
}

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

impl<'a> GenerateRequest<'a> {
    fn from_cfg(cfg: &AiConfig, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: cfg.temperature,
                top_k: cfg.top_k,
                top_p: cfg.top_p,
                max_output_tokens: cfg.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

/// Response body for `generateContent` (subset).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .first()
            .map(|p| p.text.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_array_embedded_in_prose() {
        let text = r#"Here is my review:
[
  {"type": "warning", "message": "watch out", "line": 3}
]
Hope that helps."#;

        let items = extract_findings(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, FeedbackKind::Warning);
        assert_eq!(items[0].line, Some(3));
    }

    #[test]
    fn parses_whole_body_json_array() {
        let text = r#"[{"type": "error", "message": "bad"}]"#;
        let items = extract_findings(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, FeedbackKind::Error);
    }

    #[test]
    fn unparseable_text_is_a_typed_error() {
        assert!(extract_findings("I could not find any issues.").is_err());
    }

    #[test]
    fn empty_array_without_objects_still_parses() {
        let items = extract_findings("[]").unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_empty() {
        let mut cfg = AiConfig::new(Some("key".to_string()));
        cfg.endpoint = "http://127.0.0.1:1/generate".to_string();

        let analyzer = AiAnalyzer::new(cfg);
        assert!(analyzer.enabled());
        assert!(analyzer.analyze("+print(\"x\")\n").await.is_empty());
    }

    #[tokio::test]
    async fn no_api_key_returns_empty_without_network() {
        // Endpoint is unroutable on purpose: with no key configured the
        // analyzer must bail out before building a request.
        let mut cfg = AiConfig::new(None);
        cfg.endpoint = "http://127.0.0.1:1/never".to_string();

        let analyzer = AiAnalyzer::new(cfg);
        assert!(!analyzer.enabled());
        assert!(analyzer.analyze("+print(\"x\")\n").await.is_empty());
    }
}
