use crate::orchestrator::RunDependencies;

/// Instructions given to the documentation agent on every run.
pub const SYSTEM_PROMPT: &str = "\
You are an elite documentation strategist. You analyze pull requests and decide \
which Confluence documentation must change so that the team's docs keep up with the code.

For the pull request you are given:

1. Work out what the code changes mean for existing documentation
2. Explore Confluence with the tools to find the pages involved
3. Decide which pages need to be updated, created or reviewed
4. Assign a priority based on impact and urgency
5. Say exactly which sections change and how

Tools:
- get_confluence_spaces: list the available spaces
- search_confluence_using_cql: find pages with a CQL query
- get_confluence_page: read the beginning of a page by its ID
- get_pages_in_confluence_space: list the pages of a space by its key

Guidelines:
- Focus on user-facing documentation, API docs and architectural changes
- Consider direct impacts (new features) and indirect ones (changed behavior)
- Prefer high-impact changes that affect end users or developers
- Only recommend updating a page after reading it
- Recommend a new page for significant features that have none

Each action needs action (update_page, create_page or review_page), page_title, \
space_key, reason, priority (high, medium or low) and specific_changes. \
Set page_id and existing_content_summary when the page already exists. \
Optional fields: category, \
breaking_change, checklist, related_pages, proposed_content, and patches \
(section, position before/after/replace/append, description, content).

total_actions must equal the number of confluence_actions. estimated_effort is \
low, medium or high. spaces_affected lists every space key you reference.";

/// Build the task description for one pull request.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use docscout_agent::{prompt::build_analysis_prompt, RunDependencies};
/// use docscout_core::ChangeSummary;
/// use docscout_wiki::ConfluenceClient;
///
/// let http = reqwest::Client::new();
/// let wiki = ConfluenceClient::new(http.clone(), "https://wiki.example.com", "u", "t", Default::default());
/// let deps = RunDependencies {
///     http,
///     wiki: Arc::new(wiki),
///     pr_number: 42,
///     repo: "acme/widgets".into(),
///     pr_title: "Add export API".into(),
///     pr_body: String::new(),
///     summary: ChangeSummary::default(),
/// };
/// let prompt = build_analysis_prompt(&deps);
/// assert!(prompt.contains("PR #42 in acme/widgets"));
/// ```
pub fn build_analysis_prompt(deps: &RunDependencies) -> String {
    let summary = serde_json::to_string_pretty(&deps.summary)
        .unwrap_or_else(|_| format!("{:?}", deps.summary));

    let mut prompt = format!(
        "Confluence documentation impact analysis\n\n\
         PR #{} in {}: \"{}\"\n",
        deps.pr_number, deps.repo, deps.pr_title
    );
    if !deps.pr_body.trim().is_empty() {
        prompt.push_str(&format!("\nDescription:\n{}\n", deps.pr_body.trim()));
    }
    prompt.push_str(&format!("\nCode changes:\n```json\n{summary}\n```\n"));
    prompt.push_str(
        "\nUse the tools to explore Confluence, find the pages these changes affect, \
         then return the documentation plan.\n",
    );
    prompt
}

/// Remove a surrounding Markdown code fence, if any.
pub(crate) fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
