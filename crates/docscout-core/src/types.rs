use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DocscoutError;

/// A file touched by the pull request, as reported by the GitHub
/// "list pull request files" endpoint.
///
/// # Examples
///
/// ```
/// use docscout_core::FileChange;
///
/// let change: FileChange = serde_json::from_str(
///     r#"{"filename": "src/api.rs", "additions": 12, "deletions": 3, "status": "modified"}"#,
/// ).unwrap();
/// assert_eq!(change.additions, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
    /// `added`, `modified`, `removed`, `renamed`, ... Absent means modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Compact description of a change set, embedded in the agent prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Number of files in the change set.
    pub total_files: usize,
    /// File count per extension, `no-ext` for files without one.
    pub files_by_type: BTreeMap<String, usize>,
    /// Files whose additions or deletions exceed the significance thresholds,
    /// in input order.
    pub significant_changes: Vec<String>,
    /// Sum of additions across all files.
    pub total_additions: u64,
    /// Sum of deletions across all files.
    pub total_deletions: u64,
    /// Files with status `added`.
    pub files_added: usize,
    /// Files with status `modified`, or with no status.
    pub files_modified: usize,
    /// Files with status `removed`.
    pub files_removed: usize,
}

/// What the agent recommends doing with a Confluence page.
///
/// # Examples
///
/// ```
/// use docscout_core::ActionKind;
///
/// let kind: ActionKind = serde_json::from_str("\"create_page\"").unwrap();
/// assert_eq!(kind, ActionKind::CreatePage);
/// assert_eq!(kind.to_string(), "Create");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Edit an existing page.
    #[serde(alias = "update")]
    UpdatePage,
    /// Write a new page.
    #[serde(alias = "create")]
    CreatePage,
    /// Have a human re-read an existing page.
    #[serde(alias = "review")]
    ReviewPage,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::UpdatePage => write!(f, "Update"),
            ActionKind::CreatePage => write!(f, "Create"),
            ActionKind::ReviewPage => write!(f, "Review"),
        }
    }
}

/// Urgency of a documentation action.
///
/// Ordered from most to least urgent, so sorting puts `High` first. Parsing
/// ignores case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("unknown priority '{s}', expected high, medium or low")),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// Overall effort estimate for the documentation work.
///
/// # Examples
///
/// ```
/// use docscout_core::Effort;
///
/// let effort: Effort = serde_json::from_str("\"mEdium\"").unwrap();
/// assert_eq!(effort, Effort::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl FromStr for Effort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Effort::Low),
            "medium" => Ok(Effort::Medium),
            "high" => Ok(Effort::High),
            _ => Err(format!("unknown effort '{s}', expected low, medium or high")),
        }
    }
}

impl<'de> Deserialize<'de> for Effort {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effort::Low => write!(f, "Low"),
            Effort::Medium => write!(f, "Medium"),
            Effort::High => write!(f, "High"),
        }
    }
}

/// Where a [`ContentPatch`] goes relative to its anchor section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PatchPosition {
    Before,
    After,
    Replace,
    Append,
}

impl fmt::Display for PatchPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchPosition::Before => write!(f, "before"),
            PatchPosition::After => write!(f, "after"),
            PatchPosition::Replace => write!(f, "replace"),
            PatchPosition::Append => write!(f, "append"),
        }
    }
}

/// A positioned edit to an existing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentPatch {
    /// Heading of the section the patch is anchored to.
    pub section: String,
    /// Where the content goes relative to the section.
    pub position: PatchPosition,
    /// What the patch changes and why.
    pub description: String,
    /// The text to insert, in Confluence storage format or Markdown.
    pub content: String,
}

/// A single recommended Confluence documentation change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocAction {
    /// Type of action: update_page, create_page, or review_page.
    pub action: ActionKind,
    /// Confluence page ID if updating or reviewing an existing page.
    #[serde(default)]
    pub page_id: Option<String>,
    /// Confluence space key.
    pub space_key: String,
    /// Title of the page to update or create.
    pub page_title: String,
    /// Why this documentation needs updating.
    pub reason: String,
    /// Priority level: high, medium, or low.
    pub priority: Priority,
    /// Specific changes or additions needed.
    pub specific_changes: String,
    /// Brief summary of current page content if applicable.
    #[serde(default)]
    pub existing_content_summary: Option<String>,
    /// Documentation category, e.g. "API reference", "Runbook", "Architecture".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Whether the code change breaks behavior documented on this page.
    #[serde(default)]
    pub breaking_change: bool,
    /// Concrete steps a writer should tick off.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<String>,
    /// Titles or IDs of other pages that reference this topic.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_pages: Vec<String>,
    /// Full proposed body for create_page actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_content: Option<String>,
    /// Positioned edits for update_page actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<ContentPatch>,
}

/// Final structured output of the documentation analysis.
///
/// This is both the agent's output schema and the artifact format read by
/// the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    /// List of documentation actions needed.
    pub confluence_actions: Vec<DocAction>,
    /// Brief summary of documentation impact and rationale.
    pub summary: String,
    /// Total number of actions identified; must equal the length of confluence_actions.
    pub total_actions: usize,
    /// Estimated effort: low, medium, or high.
    pub estimated_effort: Effort,
    /// List of Confluence spaces that will be affected.
    pub spaces_affected: Vec<String>,
    /// When the artifact was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    /// Check the invariants that the JSON schema alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::Schema`] when `total_actions` disagrees with
    /// the number of actions.
    ///
    /// # Examples
    ///
    /// ```
    /// use docscout_core::{AnalysisResult, Effort};
    ///
    /// let mut result = AnalysisResult {
    ///     confluence_actions: vec![],
    ///     summary: "No documentation impact".into(),
    ///     total_actions: 0,
    ///     estimated_effort: Effort::Low,
    ///     spaces_affected: vec![],
    ///     generated_at: None,
    /// };
    /// assert!(result.validate().is_ok());
    ///
    /// result.total_actions = 2;
    /// assert!(result.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), DocscoutError> {
        if self.total_actions != self.confluence_actions.len() {
            return Err(DocscoutError::Schema(format!(
                "total_actions is {} but {} actions were returned",
                self.total_actions,
                self.confluence_actions.len()
            )));
        }
        Ok(())
    }

    /// Parse and validate an artifact produced by `docscout analyze`.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::Serialization`] on malformed JSON and
    /// [`DocscoutError::Schema`] on invariant violations.
    pub fn from_json(content: &str) -> Result<Self, DocscoutError> {
        let result: Self = serde_json::from_str(content)?;
        result.validate()?;
        Ok(result)
    }
}
