//! Azure DevOps adapter (REST, organization-scoped).
//!
//! Endpoints used:
//!   * GET  {org}/_apis/git/pullrequests
//!   * GET  {org}/_apis/user
//!   * GET  {org}/_apis/git/repositories/{repo}/pullrequests
//!   * GET  {org}/_apis/git/repositories/{repo}/pullrequests/{id}
//!   * GET  {org}/_apis/git/repositories/{repo}/diffs/commits
//!   * POST {org}/_apis/git/repositories/{repo}/pullrequests/{id}/threads
//!
//! Azure DevOps has no PR text search and no raw-diff endpoint. Search is a
//! status-scoped listing filtered client-side; the unified diff is
//! synthesized from the commit-range diff between the PR's merge-target and
//! merge-source commits.

use crate::errors::{GitHostingError, GitHostingResult, ProviderError, ensure_success};
use crate::providers::types::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Azure DevOps HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct AzureDevOpsClient {
    http: Client,
    org_url: String, // e.g. "https://dev.azure.com/acme"
    token: String,   // PAT, pre-encoded for basic auth
}

impl AzureDevOpsClient {
    /// Constructs an Azure DevOps client bound to one organization URL.
    pub fn new(http: Client, org_url: String, token: String) -> Self {
        debug!("Creating AzureDevOpsClient with org_url={}", org_url);
        Self {
            http,
            org_url,
            token,
        }
    }

    fn auth_header(&self) -> String {
        format!("Basic {}", self.token)
    }

    fn organization(&self) -> String {
        self.org_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Lists PRs by status and filters them client-side on the query text.
    ///
    /// Azure DevOps exposes no PR text-search API, so title/description
    /// matching happens after the listing round trip.
    pub async fn search_prs(
        &self,
        query: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let url = format!("{}/_apis/git/pullrequests", self.org_url);
        debug!("Azure DevOps search_prs: query={}", query);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .query(&[
                ("searchCriteria.status", state.to_string()),
                ("$top", limit.to_string()),
            ])
            .send()
            .await?;

        let listing: AzureListing = ensure_success(resp).await?.json().await?;

        let needle = query.to_lowercase();
        let results = listing
            .value
            .into_iter()
            .filter(|pr| {
                pr.title.to_lowercase().contains(&needle)
                    || pr
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .map(|pr| self.summarize(pr))
            .collect();

        Ok(results)
    }

    /// Lists PRs created by `username`, resolving the authenticated identity
    /// through `GET /_apis/user` when no username was given.
    pub async fn get_user_prs(
        &self,
        username: Option<&str>,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let creator = match username {
            Some(name) => name.to_string(),
            None => {
                let url = format!("{}/_apis/user", self.org_url);
                debug!("Azure DevOps get_user_prs: resolving authenticated user");

                let resp = self
                    .http
                    .get(&url)
                    .header("Authorization", self.auth_header())
                    .header("Accept", "application/json")
                    .send()
                    .await?;

                let me: AzureUser = ensure_success(resp).await?.json().await?;
                me.display_name
            }
        };

        let url = format!("{}/_apis/git/pullrequests", self.org_url);
        debug!("Azure DevOps get_user_prs: creator={}", creator);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .query(&[
                ("searchCriteria.status", state.to_string()),
                ("searchCriteria.creatorId", creator),
                ("$top", limit.to_string()),
            ])
            .send()
            .await?;

        let listing: AzureListing = ensure_success(resp).await?.json().await?;
        Ok(listing
            .value
            .into_iter()
            .map(|pr| self.summarize(pr))
            .collect())
    }

    /// Lists PRs of one repository.
    pub async fn get_repo_prs(
        &self,
        repo_url: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let repo = parse_repo_name(repo_url)?;
        let url = format!(
            "{}/_apis/git/repositories/{}/pullrequests",
            self.org_url, repo
        );
        debug!("Azure DevOps get_repo_prs: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .query(&[
                ("searchCriteria.status", state.to_string()),
                ("$top", limit.to_string()),
            ])
            .send()
            .await?;

        let listing: AzureListing = ensure_success(resp).await?.json().await?;
        Ok(listing
            .value
            .into_iter()
            .map(|pr| self.summarize(pr))
            .collect())
    }

    /// Fetches the raw PR object, returned verbatim.
    pub async fn get_pr_details(
        &self,
        repo_url: &str,
        pr_id: u64,
    ) -> GitHostingResult<PullRequestDetails> {
        let repo = parse_repo_name(repo_url)?;
        let url = format!(
            "{}/_apis/git/repositories/{}/pullrequests/{}",
            self.org_url, repo, pr_id
        );
        debug!("Azure DevOps get_pr_details: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }

    /// Synthesizes a unified diff from the commit-range diff between the
    /// PR's merge-target and merge-source commits.
    ///
    /// The commit-range diff lists changed items without hunk bodies, so the
    /// result carries `--- a/` / `+++ b/` headers per changed file in
    /// provider order.
    pub async fn get_diff(&self, repo_url: &str, pr_id: u64) -> GitHostingResult<UnifiedDiff> {
        let repo = parse_repo_name(repo_url)?;
        let details = self.get_pr_details(repo_url, pr_id).await?;

        let target_commit = commit_id(&details, "lastMergeTargetCommit")?;
        let source_commit = commit_id(&details, "lastMergeSourceCommit")?;

        let url = format!(
            "{}/_apis/git/repositories/{}/diffs/commits",
            self.org_url, repo
        );
        debug!("Azure DevOps get_diff: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .query(&[
                ("baseVersion", target_commit),
                ("targetVersion", source_commit),
                ("diffCommonCommit", "true".to_string()),
            ])
            .send()
            .await?;

        let diff: AzureCommitDiff = ensure_success(resp).await?.json().await?;

        let mut lines = Vec::new();
        for change in diff.changes {
            let Some(path) = change.item.path else {
                continue;
            };
            let path = path.trim_start_matches('/');
            lines.push(format!("--- a/{path}"));
            lines.push(format!("+++ b/{path}"));
        }

        Ok(lines.join("\n"))
    }

    /// Posts a comment thread, positioned on the right-side file when a
    /// path and line were supplied.
    pub async fn post_comment(
        &self,
        repo_url: &str,
        pr_id: u64,
        comment: &str,
        path: Option<&str>,
        line: Option<u64>,
    ) -> GitHostingResult<serde_json::Value> {
        let repo = parse_repo_name(repo_url)?;
        let url = format!(
            "{}/_apis/git/repositories/{}/pullrequests/{}/threads",
            self.org_url, repo, pr_id
        );

        let mut payload = json!({
            "comments": [
                {
                    "parentCommentId": 0,
                    "content": comment,
                    "commentType": 1,
                }
            ],
            "status": 1,
        });

        if let (Some(path), Some(line)) = (path, line) {
            payload["threadContext"] = json!({
                "filePath": path,
                "rightFileStart": { "line": line, "offset": 1 },
                "rightFileEnd": { "line": line, "offset": 1 },
            });
        }

        debug!("Azure DevOps post_comment: {}", url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }

    fn summarize(&self, pr: AzurePr) -> PullRequestSummary {
        let updated_at = pr
            .last_merge_commit
            .and_then(|c| c.date)
            .unwrap_or(pr.creation_date);

        PullRequestSummary {
            id: pr.pull_request_id,
            title: pr.title,
            state: pr.status,
            url: format!(
                "{}/_git/{}/pullrequest/{}",
                self.org_url, pr.repository.name, pr.pull_request_id
            ),
            repo_owner: self.organization(),
            repo_name: pr.repository.name,
            repo_url: pr.repository.remote_url,
            created_at: pr.creation_date,
            updated_at,
            author: pr.created_by.display_name,
        }
    }
}

/// Extracts the repository name from an Azure DevOps repo URL, tolerating a
/// trailing `.git` suffix and trailing slash.
pub(crate) fn parse_repo_name(repo_url: &str) -> GitHostingResult<String> {
    let trimmed = repo_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    trimmed
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            GitHostingError::Validation(format!(
                "cannot parse repository name from url: {repo_url}"
            ))
        })
}

fn commit_id(details: &serde_json::Value, field: &str) -> GitHostingResult<String> {
    details
        .get(field)
        .and_then(|c| c.get("commitId"))
        .and_then(|id| id.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::InvalidResponse(format!("pull request has no {field}.commitId")).into()
        })
}

/// Listing response envelope (subset).
#[derive(Debug, Deserialize)]
struct AzureListing {
    #[serde(default)]
    value: Vec<AzurePr>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzurePr {
    pull_request_id: u64,
    title: String,
    status: String,
    #[serde(default)]
    description: Option<String>,
    repository: AzureRepository,
    creation_date: DateTime<Utc>,
    #[serde(default)]
    last_merge_commit: Option<AzureCommitRef>,
    created_by: AzureUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureRepository {
    name: String,
    remote_url: String,
}

#[derive(Debug, Deserialize)]
struct AzureCommitRef {
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureUser {
    display_name: String,
}

/// Commit-range diff response (subset).
#[derive(Debug, Deserialize)]
struct AzureCommitDiff {
    #[serde(default)]
    changes: Vec<AzureChange>,
}

#[derive(Debug, Deserialize)]
struct AzureChange {
    item: AzureChangeItem,
}

#[derive(Debug, Deserialize)]
struct AzureChangeItem {
    #[serde(default)]
    path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repo_name_variants() {
        for url in [
            "https://dev.azure.com/acme/_git/widgets",
            "https://dev.azure.com/acme/_git/widgets.git",
            "https://dev.azure.com/acme/_git/widgets/",
        ] {
            assert_eq!(parse_repo_name(url).unwrap(), "widgets");
        }
    }

    #[test]
    fn commit_id_reads_nested_field() {
        let details = serde_json::json!({
            "lastMergeTargetCommit": { "commitId": "abc123" }
        });
        assert_eq!(commit_id(&details, "lastMergeTargetCommit").unwrap(), "abc123");
        assert!(commit_id(&details, "lastMergeSourceCommit").is_err());
    }
}
