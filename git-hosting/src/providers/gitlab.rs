//! GitLab adapter (REST v4).
//!
//! Endpoints used:
//!   * GET  /api/v4/merge_requests                      (search / by author)
//!   * GET  /api/v4/user
//!   * GET  /api/v4/projects/{id}
//!   * GET  /api/v4/projects/{id}/merge_requests
//!   * GET  /api/v4/projects/{id}/merge_requests/{iid}
//!   * GET  /api/v4/projects/{id}/merge_requests/{iid}/changes
//!   * POST /api/v4/projects/{id}/merge_requests/{iid}/notes
//!
//! GitLab has no raw-diff endpoint in this flow: the unified diff is
//! synthesized from the per-file `changes` list. Inline comments are bound
//! to a diff revision, so positioning requires the MR's current diff refs
//! (one extra details read before the write).

use crate::errors::{GitHostingError, GitHostingResult, ensure_success};
use crate::providers::types::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// GitLab HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    base_api: String, // e.g. "https://gitlab.com"
    token: String,    // "Private-Token"
}

impl GitLabClient {
    /// Constructs a GitLab client with a shared HTTP instance and auth token.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        debug!("Creating GitLabClient with base_api={}", base_api);
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Searches merge requests across the instance.
    pub async fn search_prs(
        &self,
        query: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let url = format!("{}/api/v4/merge_requests", self.base_api);
        debug!("GitLab search_prs: query={}", query);

        let resp = self
            .http
            .get(&url)
            .header("Private-Token", &self.token)
            .query(&[
                ("scope", "all".to_string()),
                ("search", query.to_string()),
                ("state", state.to_string()),
                ("per_page", limit.to_string()),
                ("order_by", "updated_at".to_string()),
                ("sort", "desc".to_string()),
            ])
            .send()
            .await?;

        let mrs: Vec<GitLabMr> = ensure_success(resp).await?.json().await?;
        self.summarize(mrs).await
    }

    /// Lists MRs authored by `username`, resolving the authenticated user
    /// through `GET /user` when no username was given.
    pub async fn get_user_prs(
        &self,
        username: Option<&str>,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let author = match username {
            Some(name) => name.to_string(),
            None => {
                let url = format!("{}/api/v4/user", self.base_api);
                debug!("GitLab get_user_prs: resolving authenticated user");

                let resp = self
                    .http
                    .get(&url)
                    .header("Private-Token", &self.token)
                    .send()
                    .await?;

                let me: GitLabUser = ensure_success(resp).await?.json().await?;
                me.username
            }
        };

        let url = format!("{}/api/v4/merge_requests", self.base_api);
        debug!("GitLab get_user_prs: author={}", author);

        let resp = self
            .http
            .get(&url)
            .header("Private-Token", &self.token)
            .query(&[
                ("author_username", author),
                ("state", state.to_string()),
                ("per_page", limit.to_string()),
                ("order_by", "updated_at".to_string()),
                ("sort", "desc".to_string()),
            ])
            .send()
            .await?;

        let mrs: Vec<GitLabMr> = ensure_success(resp).await?.json().await?;
        self.summarize(mrs).await
    }

    /// Lists MRs of one project.
    pub async fn get_repo_prs(
        &self,
        repo_url: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let project = parse_project_path(repo_url)?;
        let url = format!(
            "{}/api/v4/projects/{}/merge_requests",
            self.base_api,
            urlencoding::encode(&project)
        );
        debug!("GitLab get_repo_prs: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Private-Token", &self.token)
            .query(&[
                ("state", state.to_string()),
                ("per_page", limit.to_string()),
                ("order_by", "updated_at".to_string()),
                ("sort", "desc".to_string()),
            ])
            .send()
            .await?;

        let mrs: Vec<GitLabMr> = ensure_success(resp).await?.json().await?;
        self.summarize(mrs).await
    }

    /// Fetches the raw MR object, returned verbatim.
    pub async fn get_pr_details(
        &self,
        repo_url: &str,
        pr_id: u64,
    ) -> GitHostingResult<PullRequestDetails> {
        let project = parse_project_path(repo_url)?;
        let url = format!(
            "{}/api/v4/projects/{}/merge_requests/{}",
            self.base_api,
            urlencoding::encode(&project),
            pr_id
        );
        debug!("GitLab get_pr_details: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Private-Token", &self.token)
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }

    /// Synthesizes a unified diff from the MR's per-file `changes` list.
    ///
    /// Each fragment keeps its provider order and gets `--- a/` / `+++ b/`
    /// headers so added lines stay unambiguously `+`-prefixed.
    pub async fn get_diff(&self, repo_url: &str, pr_id: u64) -> GitHostingResult<UnifiedDiff> {
        let project = parse_project_path(repo_url)?;
        let url = format!(
            "{}/api/v4/projects/{}/merge_requests/{}/changes",
            self.base_api,
            urlencoding::encode(&project),
            pr_id
        );
        debug!("GitLab get_diff: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Private-Token", &self.token)
            .send()
            .await?;

        let changes: GitLabMrChanges = ensure_success(resp).await?.json().await?;

        let mut diff_lines = Vec::new();
        for change in changes.changes {
            diff_lines.push(format!("--- a/{}", change.old_path));
            diff_lines.push(format!("+++ b/{}", change.new_path));
            diff_lines.extend(change.diff.split('\n').map(str::to_string));
        }

        Ok(diff_lines.join("\n"))
    }

    /// Posts a note on the MR.
    ///
    /// Inline positioning is tied to a specific diff revision, so when both
    /// `path` and `line` are present the MR details are fetched first (and
    /// only then) to obtain the current `diff_refs` SHAs.
    pub async fn post_comment(
        &self,
        repo_url: &str,
        pr_id: u64,
        comment: &str,
        path: Option<&str>,
        line: Option<u64>,
    ) -> GitHostingResult<serde_json::Value> {
        let project = parse_project_path(repo_url)?;
        let url = format!(
            "{}/api/v4/projects/{}/merge_requests/{}/notes",
            self.base_api,
            urlencoding::encode(&project),
            pr_id
        );

        let mut payload = json!({ "body": comment });

        if let (Some(path), Some(line)) = (path, line) {
            let details = self.get_pr_details(repo_url, pr_id).await?;
            let diff_refs = details.get("diff_refs").cloned().unwrap_or_default();

            payload["position"] = json!({
                "base_sha": diff_refs.get("base_sha"),
                "start_sha": diff_refs.get("start_sha"),
                "head_sha": diff_refs.get("head_sha"),
                "position_type": "text",
                "new_path": path,
                "new_line": line,
            });
        }

        debug!("GitLab post_comment: {}", url);
        let resp = self
            .http
            .post(&url)
            .header("Private-Token", &self.token)
            .json(&payload)
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }

    /// Normalizes raw MRs, resolving each project's names through
    /// `GET /projects/{id}`.
    ///
    /// A failed project lookup degrades to placeholder names rather than
    /// failing the listing.
    async fn summarize(&self, mrs: Vec<GitLabMr>) -> GitHostingResult<Vec<PullRequestSummary>> {
        let mut results = Vec::with_capacity(mrs.len());

        for mr in mrs {
            let (repo_owner, repo_name, repo_url) = self.resolve_project(mr.project_id).await;

            results.push(PullRequestSummary {
                id: mr.iid,
                title: mr.title,
                state: mr.state,
                url: mr.web_url,
                repo_owner,
                repo_name,
                repo_url,
                created_at: mr.created_at,
                updated_at: mr.updated_at,
                author: mr.author.username,
            });
        }

        Ok(results)
    }

    /// Looks up a project's display names; falls back to placeholders when
    /// the lookup fails for any reason.
    async fn resolve_project(&self, project_id: u64) -> (String, String, String) {
        let url = format!("{}/api/v4/projects/{}", self.base_api, project_id);

        let project: Option<GitLabProject> = match self
            .http
            .get(&url)
            .header("Private-Token", &self.token)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp.json().await.ok(),
            _ => None,
        };

        match project {
            Some(p) => (p.namespace.full_path, p.name, p.web_url),
            None => {
                warn!("GitLab project lookup failed for id={}", project_id);
                (
                    "unknown".to_string(),
                    format!("project-{project_id}"),
                    format!("{}/projects/{}", self.base_api, project_id),
                )
            }
        }
    }
}

/// Extracts the `owner/repo` project path from a GitLab web URL, tolerating
/// a trailing `.git` suffix and trailing slash.
pub(crate) fn parse_project_path(repo_url: &str) -> GitHostingResult<String> {
    let trimmed = repo_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let mut parts = trimmed.rsplit('/');
    let repo = parts.next().filter(|s| !s.is_empty());
    let owner = parts.next().filter(|s| !s.is_empty());

    match (owner, repo) {
        (Some(owner), Some(repo)) => Ok(format!("{owner}/{repo}")),
        _ => Err(GitHostingError::Validation(format!(
            "cannot parse project path from url: {repo_url}"
        ))),
    }
}

/// GitLab MR response (subset shared by all listing endpoints).
#[derive(Debug, Deserialize)]
struct GitLabMr {
    iid: u64,
    project_id: u64,
    title: String,
    state: String,
    web_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author: GitLabUser,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct GitLabProject {
    name: String,
    web_url: String,
    namespace: GitLabNamespace,
}

#[derive(Debug, Deserialize)]
struct GitLabNamespace {
    full_path: String,
}

/// `changes` endpoint response (subset).
#[derive(Debug, Deserialize)]
struct GitLabMrChanges {
    #[serde(default)]
    changes: Vec<GitLabChange>,
}

#[derive(Debug, Deserialize)]
struct GitLabChange {
    old_path: String,
    new_path: String,
    #[serde(default)]
    diff: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitLabClient {
        GitLabClient::new(reqwest::Client::new(), server.uri(), "t".to_string())
    }

    #[tokio::test]
    async fn inline_note_fetches_details_exactly_once_before_write() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/api/v4/projects/[^/]+/merge_requests/5$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "diff_refs": {"base_sha": "b", "start_sha": "s", "head_sha": "h"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/api/v4/projects/[^/]+/merge_requests/5/notes$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .post_comment(
                "https://gitlab.com/group/widgets",
                5,
                "watch out",
                Some("app.py"),
                Some(3),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn general_note_skips_the_details_fetch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/api/v4/projects/[^/]+/merge_requests/5$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/api/v4/projects/[^/]+/merge_requests/5/notes$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .post_comment("https://gitlab.com/group/widgets", 5, "watch out", None, None)
            .await
            .unwrap();
    }

    #[test]
    fn parses_project_path_with_git_suffix() {
        let path = parse_project_path("https://gitlab.com/group/widgets.git").unwrap();
        assert_eq!(path, "group/widgets");
    }

    #[test]
    fn parses_project_path_with_trailing_slash() {
        let path = parse_project_path("https://gitlab.com/group/widgets/").unwrap();
        assert_eq!(path, "group/widgets");
    }

    #[test]
    fn project_path_urlencodes_to_single_segment() {
        let path = parse_project_path("https://gitlab.com/group/widgets").unwrap();
        assert_eq!(urlencoding::encode(&path), "group%2Fwidgets");
    }
}
