//! The documentation agent: an LLM that explores Confluence through tools
//! and answers with an [`AnalysisResult`](docscout_core::AnalysisResult).
//!
//! [`DocsOrchestrator`] is the entry point. It builds the prompt from a
//! [`RunDependencies`] bundle and runs one [`agent::Agent`] exchange over
//! the [`tools::WikiToolkit`] against any [`llm::ChatBackend`].

pub mod agent;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod tools;

pub use orchestrator::{DocsOrchestrator, RunDependencies};
