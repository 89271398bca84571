//! Unified client layer for git-hosting providers.
//!
//! Maps the heterogeneous GitHub/GitLab/Bitbucket/Azure DevOps APIs onto one
//! capability contract: search and list pull requests, fetch details and a
//! unified diff, post general or inline comments.

mod errors;
pub mod providers;

pub use errors::{ConfigError, GitHostingError, GitHostingResult, ProviderError};
pub use providers::{
    ProviderClient, ProviderConfig, ProviderKind, PullRequestDetails, PullRequestSummary,
    StateFilter, UnifiedDiff,
};
