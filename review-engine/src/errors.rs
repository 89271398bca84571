//! Crate-wide error type for review-engine.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReviewEngineResult<T> = Result<T, ReviewEngineError>;

/// Root error type for the review-engine crate.
///
/// Analyzer failures never surface here: static analysis is infallible and
/// AI analysis degrades to empty/placeholder feedback. What remains is the
/// git-hosting layer, whose errors are fatal to the current review.
#[derive(Debug, Error)]
pub enum ReviewEngineError {
    /// Provider/transport failure while talking to the git host.
    #[error(transparent)]
    Hosting(#[from] git_hosting::GitHostingError),
}
