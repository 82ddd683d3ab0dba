//! Core types, configuration, and error handling for docscout.
//!
//! This crate provides the shared foundation used by the other docscout crates:
//! - [`DocscoutError`], the unified error type using `thiserror`
//! - [`DocscoutConfig`], tunables loaded from `.docscout.toml`, and
//!   [`RunConfig`], secrets and PR coordinates read once from the environment
//! - Shared types: [`FileChange`], [`ChangeSummary`], [`DocAction`],
//!   [`AnalysisResult`]
//! - [`analyze_changes`], the change-set summarizer

pub mod analysis;
mod config;
mod error;
mod types;

pub use analysis::analyze_changes;
pub use config::{
    AnalyzerConfig, DocscoutConfig, GitHubConfig, HttpConfig, LlmConfig, OutputConfig,
    PullRequestRef, RunConfig, WikiConfig, MIN_COMMENT_CHAR_LIMIT,
};
pub use error::DocscoutError;
pub use types::{
    ActionKind, AnalysisResult, ChangeSummary, ContentPatch, DocAction, Effort, FileChange,
    PatchPosition, Priority,
};

/// A convenience `Result` type for docscout operations.
pub type Result<T> = std::result::Result<T, DocscoutError>;
