use std::sync::Arc;

use docscout_core::{AnalysisResult, ChangeSummary, DocscoutError, LlmConfig, WikiConfig};
use docscout_wiki::WikiApi;

use crate::agent::Agent;
use crate::llm::ChatBackend;
use crate::prompt::{build_analysis_prompt, SYSTEM_PROMPT};
use crate::tools::WikiToolkit;

/// Everything one analysis run needs, assembled by the caller.
pub struct RunDependencies {
    /// Shared connection pool for every outbound HTTP call of the run.
    ///
    /// Not read by [`DocsOrchestrator::run`]: the wiki client and the chat
    /// backend are built from clones of it, and this handle keeps the pool
    /// alive for the whole run.
    pub http: reqwest::Client,
    pub wiki: Arc<dyn WikiApi>,
    pub pr_number: u64,
    /// Repository as `owner/name`.
    pub repo: String,
    pub pr_title: String,
    /// May be empty.
    pub pr_body: String,
    pub summary: ChangeSummary,
}

/// Runs the documentation agent for one pull request.
///
/// # Examples
///
/// ```
/// use docscout_agent::{llm::LlmClient, DocsOrchestrator};
/// use docscout_core::{LlmConfig, WikiConfig};
///
/// let llm = LlmClient::new(reqwest::Client::new(), "sk-test", &LlmConfig::default());
/// let _orchestrator = DocsOrchestrator::new(&llm, &LlmConfig::default(), &WikiConfig::default());
/// ```
pub struct DocsOrchestrator<'a> {
    backend: &'a dyn ChatBackend,
    max_retries: u32,
    max_turns: u32,
    preview_chars: usize,
}

impl<'a> DocsOrchestrator<'a> {
    pub fn new(backend: &'a dyn ChatBackend, llm: &LlmConfig, wiki: &WikiConfig) -> Self {
        Self {
            backend,
            max_retries: llm.max_retries,
            max_turns: llm.max_turns,
            preview_chars: wiki.preview_chars,
        }
    }

    /// Ask the agent for a documentation plan.
    ///
    /// There is no retry at this level: the retry budgets live inside the
    /// exchange, and a failed exchange ends the run.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::Exhausted`] when the agent runs out of
    /// retries or turns, or the backend's error when the model is
    /// unreachable.
    pub async fn run(&self, deps: &RunDependencies) -> Result<AnalysisResult, DocscoutError> {
        let prompt = build_analysis_prompt(deps);
        let toolkit = WikiToolkit::new(deps.wiki.as_ref(), self.preview_chars);
        let agent = Agent::new(self.backend, SYSTEM_PROMPT)
            .with_max_retries(self.max_retries)
            .with_max_turns(self.max_turns);

        tracing::info!(pr = deps.pr_number, repo = %deps.repo, "starting documentation analysis");
        let result: AnalysisResult = agent
            .generate(&prompt, &toolkit, AnalysisResult::validate)
            .await?;
        tracing::info!(
            actions = result.total_actions,
            spaces = result.spaces_affected.len(),
            "analysis complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docscout_core::{ActionKind, Effort, Priority};

    use super::*;
    use crate::agent::tests::{tool_call, ScriptedBackend};
    use crate::llm::{ChatMessage, Role};
    use crate::tools::tests::sample_wiki;

    const PLAN: &str = r#"{
        "confluence_actions": [{
            "action": "update_page",
            "page_id": "101",
            "page_title": "Export API",
            "space_key": "ENG",
            "reason": "New CSV format",
            "priority": "high",
            "specific_changes": "Document the csv format parameter"
        }],
        "summary": "The export API gained a CSV option.",
        "total_actions": 1,
        "estimated_effort": "low",
        "spaces_affected": ["ENG"]
    }"#;

    fn deps() -> RunDependencies {
        RunDependencies {
            http: reqwest::Client::new(),
            wiki: Arc::new(sample_wiki()),
            pr_number: 7,
            repo: "acme/widgets".into(),
            pr_title: "Add CSV export".into(),
            pr_body: String::new(),
            summary: ChangeSummary::default(),
        }
    }

    #[tokio::test]
    async fn returns_validated_plan_after_exploring_wiki() {
        let backend = ScriptedBackend::new([
            tool_call("call_1", "search_confluence_using_cql", r#"{"cql":"title = \"Export API\""}"#),
            tool_call("call_2", "get_confluence_page", r#"{"page_id":"101"}"#),
            ChatMessage::assistant(PLAN),
        ]);
        let orchestrator =
            DocsOrchestrator::new(&backend, &LlmConfig::default(), &WikiConfig::default());

        let result = orchestrator.run(&deps()).await.unwrap();
        assert_eq!(result.total_actions, 1);
        let action = &result.confluence_actions[0];
        assert_eq!(action.action, ActionKind::UpdatePage);
        assert_eq!(action.priority, Priority::High);
        assert_eq!(result.estimated_effort, Effort::Low);

        let seen = backend.seen.lock().unwrap();
        let search_reply = seen[1].last().unwrap();
        assert_eq!(search_reply.role, Role::Tool);
        assert!(search_reply.content.as_deref().unwrap().contains("\"space\": \"ENG\""));
    }

    #[tokio::test]
    async fn count_mismatch_is_sent_back_then_exhausts() {
        let bad = PLAN.replace("\"total_actions\": 1", "\"total_actions\": 2");
        let backend = ScriptedBackend::new(
            std::iter::repeat_with(|| ChatMessage::assistant(bad.clone())).take(8),
        );
        let orchestrator =
            DocsOrchestrator::new(&backend, &LlmConfig::default(), &WikiConfig::default());

        let err = orchestrator.run(&deps()).await.unwrap_err();
        assert!(matches!(err, DocscoutError::Exhausted(_)));
        assert_eq!(backend.calls(), 4);
        let seen = backend.seen.lock().unwrap();
        let correction = seen[1].last().unwrap();
        assert!(correction.content.as_deref().unwrap().contains("total_actions is 2"));
    }

    #[tokio::test]
    async fn unreachable_model_fails_the_run() {
        let backend = ScriptedBackend::default();
        let orchestrator =
            DocsOrchestrator::new(&backend, &LlmConfig::default(), &WikiConfig::default());
        let err = orchestrator.run(&deps()).await.unwrap_err();
        assert!(matches!(err, DocscoutError::Llm(_)));
        assert_eq!(backend.calls(), 1);
    }
}
