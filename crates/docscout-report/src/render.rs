//! Markdown rendering of an [`AnalysisResult`] for a pull request comment.

use std::fmt::Write;
use std::path::Path;

use docscout_core::{AnalysisResult, DocAction, Priority};

use crate::split::split_comment;

const HEADING: &str = "## 📚 Confluence Documentation Analysis";

/// Posted when the analysis step left no artifact behind.
pub const NO_RESULTS_COMMENT: &str = "## 📚 Confluence Documentation Analysis

No results found: the documentation analysis did not produce an artifact for this pull request.

Check the `analyze` step of the workflow run for details.";

/// Fallback comment for an artifact that could not be read or rendered.
///
/// # Examples
///
/// ```
/// use docscout_report::render::error_comment;
///
/// let body = error_comment("expected value at line 1 column 1");
/// assert!(body.contains("expected value at line 1 column 1"));
/// ```
pub fn error_comment(message: &str) -> String {
    format!(
        "{HEADING}\n\n\
         ⚠️ The analysis results could not be rendered.\n\n\
         ```\n{message}\n```\n\n\
         Check the workflow run for details."
    )
}

fn priority_badge(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    }
}

/// Pick a code fence longer than any backtick run in `content`.
fn fence_for(content: &str) -> String {
    let longest = content
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Render a full analysis as a Markdown comment body.
///
/// Actions are grouped by priority, high first; within a group they keep the
/// order the agent returned them in.
///
/// # Examples
///
/// ```
/// use docscout_core::{AnalysisResult, Effort};
/// use docscout_report::render::render_markdown;
///
/// let result = AnalysisResult {
///     confluence_actions: vec![],
///     summary: "No documentation impact.".into(),
///     total_actions: 0,
///     estimated_effort: Effort::Low,
///     spaces_affected: vec![],
///     generated_at: None,
/// };
/// let md = render_markdown(&result);
/// assert!(md.contains("No documentation impact."));
/// assert!(md.contains("No documentation changes are needed"));
/// ```
pub fn render_markdown(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADING}\n");
    let _ = writeln!(out, "{}\n", result.summary.trim());

    let spaces = if result.spaces_affected.is_empty() {
        "none".to_string()
    } else {
        result
            .spaces_affected
            .iter()
            .map(|s| format!("`{s}`"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    out.push_str("| Metric | Value |\n");
    out.push_str("|--------|-------|\n");
    let _ = writeln!(out, "| Actions | {} |", result.total_actions);
    let _ = writeln!(out, "| Estimated effort | {} |", result.estimated_effort);
    let _ = writeln!(out, "| Spaces affected | {spaces} |");
    let breaking = result
        .confluence_actions
        .iter()
        .filter(|a| a.breaking_change)
        .count();
    if breaking > 0 {
        let _ = writeln!(out, "| Breaking changes | {breaking} |");
    }
    out.push('\n');

    if result.confluence_actions.is_empty() {
        out.push_str("✅ No documentation changes are needed for this pull request.\n");
    }

    let mut number = 0;
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        let group: Vec<&DocAction> = result
            .confluence_actions
            .iter()
            .filter(|a| a.priority == priority)
            .collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "### {} {priority} priority ({})\n",
            priority_badge(priority),
            group.len()
        );
        for action in group {
            number += 1;
            render_action(&mut out, number, action);
        }
    }

    if let Some(at) = result.generated_at {
        let _ = write!(
            out,
            "---\n_Generated by docscout on {}_\n",
            at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    out
}

fn render_action(out: &mut String, number: usize, action: &DocAction) {
    let _ = writeln!(out, "#### {number}. {}: {}\n", action.action, action.page_title);
    let _ = writeln!(out, "- **Space:** `{}`", action.space_key);
    if let Some(id) = &action.page_id {
        let _ = writeln!(out, "- **Page ID:** `{id}`");
    }
    if let Some(category) = &action.category {
        let _ = writeln!(out, "- **Category:** {category}");
    }
    if action.breaking_change {
        out.push_str("- **⚠️ Breaking change**\n");
    }
    out.push('\n');

    let _ = writeln!(out, "**Why:** {}\n", action.reason.trim());
    let _ = writeln!(out, "**What to change:** {}\n", action.specific_changes.trim());
    if let Some(existing) = &action.existing_content_summary {
        let _ = writeln!(out, "**Current content:** {}\n", existing.trim());
    }

    if !action.patches.is_empty() {
        out.push_str("**Patches:**\n\n");
        for (i, patch) in action.patches.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. `{}` **{}**: {}",
                i + 1,
                patch.position,
                patch.section,
                patch.description.trim()
            );
            if !patch.content.trim().is_empty() {
                let fence = fence_for(&patch.content);
                let _ = writeln!(out, "\n{fence}\n{}\n{fence}", patch.content.trim_end());
            }
        }
        out.push('\n');
    }

    if let Some(content) = &action.proposed_content {
        let _ = writeln!(
            out,
            "<details>\n<summary>Proposed content</summary>\n\n{}\n\n</details>\n",
            content.trim()
        );
    }

    if !action.related_pages.is_empty() {
        let _ = writeln!(out, "**Related pages:** {}\n", action.related_pages.join(", "));
    }

    if !action.checklist.is_empty() {
        out.push_str("**Checklist:**\n");
        for item in &action.checklist {
            let _ = writeln!(out, "- [ ] {item}");
        }
        out.push('\n');
    }
}

/// Turn the artifact at `path` into comment bodies ready to post.
///
/// Never fails: a missing artifact yields [`NO_RESULTS_COMMENT`], and an
/// unreadable or invalid one yields an [`error_comment`].
pub fn render_artifact(path: &Path, limit: usize) -> Vec<String> {
    let body = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "no analysis artifact found");
            NO_RESULTS_COMMENT.to_string()
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read analysis artifact");
            error_comment(&format!("failed to read {}: {e}", path.display()))
        }
        Ok(text) => match AnalysisResult::from_json(&text) {
            Ok(result) => render_markdown(&result),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "invalid analysis artifact");
                error_comment(&e.to_string())
            }
        },
    };
    split_comment(&body, limit)
}
