//! Two-stage PR analysis: pattern-based static checks plus optional
//! LLM review, merged into one deduplicated, scored feedback set.

pub mod agent;
pub mod analyzers;
mod errors;
pub mod feedback;

pub use agent::{ReviewAgent, SearchParams, calculate_score};
pub use analyzers::CodeAnalyzer;
pub use analyzers::ai::AiConfig;
pub use errors::{ReviewEngineError, ReviewEngineResult};
pub use feedback::{FeedbackItem, FeedbackKind, ReviewResult};
