//! Review orchestrator: fetch -> analyze -> score -> (optional) publish.

use git_hosting::{ProviderClient, PullRequestSummary};
use tracing::{debug, error, info};

use crate::analyzers::CodeAnalyzer;
use crate::errors::ReviewEngineResult;
use crate::feedback::{FeedbackItem, ReviewResult};

/// Caller-facing search filters; at most one of them is used per call.
#[derive(Debug, Default, Clone)]
pub struct SearchParams {
    pub query: Option<String>,
    pub username: Option<String>,
    pub repo_url: Option<String>,
    /// Provider-native state string (already mapped by the caller).
    pub state: String,
    pub limit: u32,
}

/// Which adapter operation a search delegates to.
///
/// Priority: repository, then author, then free-text query, else the
/// authenticated user's own PRs. Exactly one adapter call per search.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchPlan<'a> {
    Repo(&'a str),
    User(&'a str),
    Query(&'a str),
    OwnPrs,
}

impl SearchParams {
    /// Resolves the delegation target from the populated filters.
    pub fn plan(&self) -> SearchPlan<'_> {
        if let Some(repo_url) = self.repo_url.as_deref() {
            SearchPlan::Repo(repo_url)
        } else if let Some(username) = self.username.as_deref() {
            SearchPlan::User(username)
        } else if let Some(query) = self.query.as_deref() {
            SearchPlan::Query(query)
        } else {
            SearchPlan::OwnPrs
        }
    }
}

/// Drives one review or search end to end against a configured provider.
pub struct ReviewAgent {
    client: ProviderClient,
    analyzer: CodeAnalyzer,
}

impl ReviewAgent {
    pub fn new(client: ProviderClient, analyzer: CodeAnalyzer) -> Self {
        Self { client, analyzer }
    }

    /// Access to the underlying provider client.
    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    /// Reviews one pull request: details -> diff -> analysis -> score, then
    /// optionally posts every feedback item back as a comment.
    pub async fn review_pr(
        &self,
        repo_url: &str,
        pr_id: u64,
        post_comments: bool,
    ) -> ReviewEngineResult<ReviewResult> {
        info!("Reviewing PR #{} in {}", pr_id, repo_url);

        let pr_details = self.client.get_pr_details(repo_url, pr_id).await?;
        let diff = self.client.get_diff(repo_url, pr_id).await?;
        debug!("Retrieved diff with {} characters", diff.len());

        let feedback = self.analyzer.analyze_diff(&diff).await;
        let score = calculate_score(&feedback);

        if post_comments {
            self.post_feedback_comments(repo_url, pr_id, &feedback).await;
        }

        Ok(ReviewResult {
            pr_details,
            feedback,
            score,
        })
    }

    /// Delegates one search to the adapter method picked by
    /// [`SearchParams::plan`].
    pub async fn search_prs(
        &self,
        params: &SearchParams,
    ) -> ReviewEngineResult<Vec<PullRequestSummary>> {
        let results = match params.plan() {
            SearchPlan::Repo(repo_url) => {
                self.client
                    .get_repo_prs(repo_url, &params.state, params.limit)
                    .await?
            }
            SearchPlan::User(username) => {
                self.client
                    .get_user_prs(Some(username), &params.state, params.limit)
                    .await?
            }
            SearchPlan::Query(query) => {
                self.client
                    .search_prs(query, &params.state, params.limit)
                    .await?
            }
            SearchPlan::OwnPrs => {
                self.client
                    .get_user_prs(None, &params.state, params.limit)
                    .await?
            }
        };

        Ok(results)
    }

    /// Posts every feedback item as a comment, best-effort: one failed post
    /// is logged and does not abort the remaining items.
    async fn post_feedback_comments(
        &self,
        repo_url: &str,
        pr_id: u64,
        feedback: &[FeedbackItem],
    ) {
        info!("Posting {} comments to PR #{}", feedback.len(), pr_id);

        for item in feedback {
            let message = format_comment(item);

            match self
                .client
                .post_comment(repo_url, pr_id, &message, item.path.as_deref(), item.line)
                .await
            {
                Ok(_) => {
                    let preview: String = item.message.chars().take(50).collect();
                    debug!("Posted comment: {} - {}...", item.kind.label(), preview);
                }
                Err(err) => error!("Failed to post comment: {err}"),
            }
        }
    }
}

/// Quality score: start at 100, subtract each finding's weight, clamp.
pub fn calculate_score(feedback: &[FeedbackItem]) -> f64 {
    let score = feedback
        .iter()
        .fold(100.0, |acc, item| acc - item.kind.weight());

    score.clamp(0.0, 100.0)
}

/// Renders one feedback item as a provider comment body.
pub fn format_comment(item: &FeedbackItem) -> String {
    let mut message = format!("**{}**: {}", item.kind.label(), item.message);
    if let Some(snippet) = &item.code_snippet {
        message.push_str(&format!("\n\n```\n{snippet}\n```"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackKind;

    fn item(kind: FeedbackKind) -> FeedbackItem {
        FeedbackItem {
            kind,
            message: "m".to_string(),
            line: None,
            code_snippet: None,
            suggestion: None,
            path: None,
        }
    }

    #[test]
    fn empty_feedback_scores_perfect() {
        assert_eq!(calculate_score(&[]), 100.0);
    }

    #[test]
    fn weights_apply_per_kind() {
        let feedback = vec![
            item(FeedbackKind::Error),
            item(FeedbackKind::Warning),
            item(FeedbackKind::Info),
            item(FeedbackKind::Suggestion),
            item(FeedbackKind::Other),
        ];
        let expected = 100.0 - 5.0 - 2.0 - 0.5 - 0.2 - 0.5;
        assert!((calculate_score(&feedback) - expected).abs() < 1e-9);
    }

    #[test]
    fn score_is_monotonically_non_increasing() {
        let mut feedback = Vec::new();
        let mut previous = calculate_score(&feedback);

        for _ in 0..30 {
            feedback.push(item(FeedbackKind::Error));
            let next = calculate_score(&feedback);
            assert!(next <= previous);
            previous = next;
        }
    }

    #[test]
    fn score_clamps_to_zero() {
        let feedback: Vec<_> = (0..50).map(|_| item(FeedbackKind::Error)).collect();
        assert_eq!(calculate_score(&feedback), 0.0);
    }

    #[test]
    fn repo_url_takes_priority_over_username() {
        let params = SearchParams {
            query: Some("fix".to_string()),
            username: Some("alice".to_string()),
            repo_url: Some("https://github.com/acme/widgets".to_string()),
            state: "open".to_string(),
            limit: 10,
        };
        assert_eq!(params.plan(), SearchPlan::Repo("https://github.com/acme/widgets"));
    }

    #[test]
    fn username_beats_query_and_absence_falls_back_to_own_prs() {
        let params = SearchParams {
            query: Some("fix".to_string()),
            username: Some("alice".to_string()),
            ..Default::default()
        };
        assert_eq!(params.plan(), SearchPlan::User("alice"));

        let params = SearchParams {
            query: Some("fix".to_string()),
            ..Default::default()
        };
        assert_eq!(params.plan(), SearchPlan::Query("fix"));

        assert_eq!(SearchParams::default().plan(), SearchPlan::OwnPrs);
    }

    #[test]
    fn comment_format_includes_fenced_snippet() {
        let mut i = item(FeedbackKind::Warning);
        i.message = "use logging".to_string();
        i.code_snippet = Some("print(\"x\")".to_string());

        let body = format_comment(&i);
        assert!(body.starts_with("**WARNING**: use logging"));
        assert!(body.contains("```\nprint(\"x\")\n```"));
    }
}
