//! Provider-agnostic data model for pull/merge requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported git-hosting providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProviderKind {
    GitHub,
    GitLab,
    Bitbucket,
    AzureDevOps,
}

impl ProviderKind {
    /// All providers the crate knows about, in display order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::GitHub,
        ProviderKind::GitLab,
        ProviderKind::Bitbucket,
        ProviderKind::AzureDevOps,
    ];

    /// Short identifier used on the CLI and in API requests.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
            ProviderKind::Bitbucket => "bitbucket",
            ProviderKind::AzureDevOps => "azure",
        }
    }

    /// Human-readable provider name.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "GitHub",
            ProviderKind::GitLab => "GitLab",
            ProviderKind::Bitbucket => "Bitbucket",
            ProviderKind::AzureDevOps => "Azure DevOps",
        }
    }

    /// Default API base, when the provider has a canonical cloud endpoint.
    ///
    /// Azure DevOps has none: the organization URL must be supplied.
    pub fn default_base_api(&self) -> Option<&'static str> {
        match self {
            ProviderKind::GitHub => Some("https://api.github.com"),
            ProviderKind::GitLab => Some("https://gitlab.com"),
            ProviderKind::Bitbucket => Some("https://api.bitbucket.org/2.0"),
            ProviderKind::AzureDevOps => None,
        }
    }

    /// Maps the generic state vocabulary onto this provider's own.
    ///
    /// Adapters take provider-native state strings verbatim; callers map a
    /// generic state through this before calling.
    pub fn native_state(&self, state: StateFilter) -> &'static str {
        match (self, state) {
            (ProviderKind::GitHub, StateFilter::Open) => "open",
            (ProviderKind::GitHub, StateFilter::Closed) => "closed",
            (ProviderKind::GitHub, StateFilter::All) => "all",
            (ProviderKind::GitLab, StateFilter::Open) => "opened",
            (ProviderKind::GitLab, StateFilter::Closed) => "closed",
            (ProviderKind::GitLab, StateFilter::All) => "all",
            (ProviderKind::Bitbucket, StateFilter::Open) => "OPEN",
            (ProviderKind::Bitbucket, StateFilter::Closed) => "MERGED",
            (ProviderKind::Bitbucket, StateFilter::All) => "ALL",
            (ProviderKind::AzureDevOps, StateFilter::Open) => "active",
            (ProviderKind::AzureDevOps, StateFilter::Closed) => "completed",
            (ProviderKind::AzureDevOps, StateFilter::All) => "all",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(ProviderKind::GitHub),
            "gitlab" => Ok(ProviderKind::GitLab),
            "bitbucket" => Ok(ProviderKind::Bitbucket),
            "azure" => Ok(ProviderKind::AzureDevOps),
            other => Err(format!("unsupported git server: {other}")),
        }
    }
}

/// Generic PR state filter used by callers before provider mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Open,
    Closed,
    All,
}

impl FromStr for StateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(StateFilter::Open),
            "closed" => Ok(StateFilter::Closed),
            "all" => Ok(StateFilter::All),
            other => Err(format!("unsupported state: {other}")),
        }
    }
}

/// One pull/merge request as returned by listing and search operations.
///
/// Read-only and provider-normalized; no lifecycle beyond the response that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub id: u64,
    pub title: String,
    pub state: String,
    pub url: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub repo_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: String,
}

/// Raw provider-specific PR object, returned verbatim by `get_pr_details`.
///
/// The orchestrator treats this as opaque except for a `title` field used
/// for display.
pub type PullRequestDetails = serde_json::Value;

/// Unified-diff text. Added lines are `+`-prefixed and never `+++` headers.
pub type UnifiedDiff = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_known_ids() {
        assert_eq!("github".parse::<ProviderKind>(), Ok(ProviderKind::GitHub));
        assert_eq!("AZURE".parse::<ProviderKind>(), Ok(ProviderKind::AzureDevOps));
        assert!("gitea".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn native_state_covers_every_provider_vocabulary() {
        assert_eq!(ProviderKind::GitLab.native_state(StateFilter::Open), "opened");
        assert_eq!(ProviderKind::Bitbucket.native_state(StateFilter::Closed), "MERGED");
        assert_eq!(ProviderKind::AzureDevOps.native_state(StateFilter::Open), "active");
        assert_eq!(ProviderKind::GitHub.native_state(StateFilter::All), "all");
    }
}
