use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DocscoutError;

/// Tunables loaded from `.docscout.toml`.
///
/// Every section is optional; an empty file yields the defaults.
///
/// # Examples
///
/// ```
/// use docscout_core::DocscoutConfig;
///
/// let config = DocscoutConfig::default();
/// assert_eq!(config.llm.max_retries, 3);
/// assert_eq!(config.output.comment_char_limit, 60_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocscoutConfig {
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Change-set significance thresholds.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// Confluence request limits and tool-output shaping.
    #[serde(default)]
    pub wiki: WikiConfig,
    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Artifact and comment settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

impl DocscoutConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::Io`] if the file cannot be read, or
    /// [`DocscoutError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, DocscoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::Toml`] if parsing fails, or
    /// [`DocscoutError::Config`] if `[output] comment_char_limit` is below
    /// [`MIN_COMMENT_CHAR_LIMIT`].
    ///
    /// # Examples
    ///
    /// ```
    /// use docscout_core::DocscoutConfig;
    ///
    /// let toml = r#"
    /// [analyzer]
    /// significant_additions = 50
    /// "#;
    /// let config = DocscoutConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.analyzer.significant_additions, 50);
    /// assert_eq!(config.analyzer.significant_deletions, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DocscoutError> {
        let config: Self = toml::from_str(content)?;
        if config.output.comment_char_limit < MIN_COMMENT_CHAR_LIMIT {
            return Err(DocscoutError::Config(format!(
                "[output] comment_char_limit must be at least {MIN_COMMENT_CHAR_LIMIT}, got {}",
                config.output.comment_char_limit
            )));
        }
        Ok(config)
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Custom base URL for an OpenAI-compatible API.
    pub base_url: Option<String>,
    /// Retries allowed per tool and for the final output (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Upper bound on model round-trips in one exchange (default: 16).
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Sampling temperature (default: 0.1).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "gpt-4.1".into()
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_turns() -> u32 {
    16
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            max_retries: default_max_retries(),
            max_turns: default_max_turns(),
            temperature: default_temperature(),
        }
    }
}

/// Thresholds above which a file counts as a significant change.
///
/// Both comparisons are strict: a file with exactly `significant_additions`
/// added lines is not significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Additions threshold (default: 20).
    #[serde(default = "default_significant_additions")]
    pub significant_additions: u64,
    /// Deletions threshold (default: 10).
    #[serde(default = "default_significant_deletions")]
    pub significant_deletions: u64,
}

fn default_significant_additions() -> u64 {
    20
}

fn default_significant_deletions() -> u64 {
    10
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            significant_additions: default_significant_additions(),
            significant_deletions: default_significant_deletions(),
        }
    }
}

/// Confluence request limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Maximum spaces returned by the space listing (default: 50).
    #[serde(default = "default_space_limit")]
    pub space_limit: u32,
    /// Maximum results returned by a CQL search (default: 25).
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Maximum pages returned when listing a space (default: 25).
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Characters of page body handed to the agent (default: 1000).
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

fn default_space_limit() -> u32 {
    50
}

fn default_search_limit() -> u32 {
    25
}

fn default_page_limit() -> u32 {
    25
}

fn default_preview_chars() -> usize {
    1000
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            space_limit: default_space_limit(),
            search_limit: default_search_limit(),
            page_limit: default_page_limit(),
            preview_chars: default_preview_chars(),
        }
    }
}

/// Outbound HTTP configuration shared by every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (default: 60).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Artifact location and PR comment sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where `analyze` writes and `render` reads the result artifact.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Maximum characters per posted comment (default: 60000).
    #[serde(default = "default_comment_char_limit")]
    pub comment_char_limit: usize,
}

/// Smallest accepted comment size; continuation parts need room for their
/// `**Part N/M**` header.
pub const MIN_COMMENT_CHAR_LIMIT: usize = 1_000;

fn default_output_path() -> PathBuf {
    PathBuf::from("confluence_actions.json")
}

fn default_comment_char_limit() -> usize {
    60_000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            comment_char_limit: default_comment_char_limit(),
        }
    }
}

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root (default: `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
        }
    }
}

/// Secrets and pull-request coordinates for one `analyze` run.
///
/// Built once at process start from the environment and passed down; nothing
/// below the binary reads `std::env` directly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub openai_api_key: String,
    pub confluence_url: String,
    pub confluence_username: String,
    pub confluence_api_token: String,
    pub pull_request: PullRequestRef,
    pub pr_title: String,
    pub pr_body: String,
}

/// The pull request a run is about, plus the token used to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub github_token: String,
    /// `owner/repo`.
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    /// Split `repo` into owner and name.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::Config`] if `repo` is not `owner/name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use docscout_core::PullRequestRef;
    ///
    /// let pr = PullRequestRef {
    ///     github_token: "t".into(),
    ///     repo: "octocat/hello-world".into(),
    ///     number: 42,
    /// };
    /// assert_eq!(pr.owner_and_name().unwrap(), ("octocat", "hello-world"));
    /// ```
    pub fn owner_and_name(&self) -> Result<(&str, &str), DocscoutError> {
        match self.repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok((owner, name))
            }
            _ => Err(DocscoutError::Config(format!(
                "invalid REPO_NAME '{}', expected owner/repo",
                self.repo
            ))),
        }
    }
}

const ANALYZE_REQUIRED: &[&str] = &[
    "OPENAI_API_KEY",
    "CONFLUENCE_URL",
    "CONFLUENCE_USERNAME",
    "CONFLUENCE_API_TOKEN",
    "GITHUB_TOKEN",
    "PR_NUMBER",
    "REPO_NAME",
    "PR_TITLE",
];

const RENDER_REQUIRED: &[&str] = &["GITHUB_TOKEN", "PR_NUMBER", "REPO_NAME"];

/// Collect the required names, failing with every missing one at once.
fn require<F>(names: &[&str], lookup: &F) -> Result<Vec<String>, DocscoutError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = Vec::with_capacity(names.len());
    let mut missing = Vec::new();
    for name in names {
        match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(v) => values.push(v),
            None => missing.push((*name).to_string()),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(DocscoutError::MissingEnv(missing))
    }
}

fn parse_pr_number(raw: &str) -> Result<u64, DocscoutError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(DocscoutError::Config(format!(
            "PR_NUMBER must be a positive integer, got '{raw}'"
        ))),
    }
}

impl RunConfig {
    /// Build the run configuration from a variable lookup.
    ///
    /// Pass `|k| std::env::var(k).ok()` in production; tests pass a map.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::MissingEnv`] naming every unset variable, or
    /// [`DocscoutError::Config`] if `PR_NUMBER` is not a positive integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use docscout_core::RunConfig;
    ///
    /// let err = RunConfig::from_lookup(|_| None).unwrap_err();
    /// assert!(err.to_string().contains("OPENAI_API_KEY"));
    /// assert!(err.to_string().contains("REPO_NAME"));
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DocscoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = require(ANALYZE_REQUIRED, &lookup)?;
        let [openai_api_key, confluence_url, confluence_username, confluence_api_token, github_token, pr_number, repo, pr_title]: [String; 8] =
            values
                .try_into()
                .map_err(|_| DocscoutError::Config("environment lookup mismatch".into()))?;

        let pull_request = PullRequestRef {
            github_token,
            repo,
            number: parse_pr_number(&pr_number)?,
        };
        pull_request.owner_and_name()?;

        Ok(Self {
            openai_api_key,
            confluence_url,
            confluence_username,
            confluence_api_token,
            pull_request,
            pr_title,
            pr_body: lookup("PR_BODY").unwrap_or_default(),
        })
    }
}

impl PullRequestRef {
    /// Build the comment-posting coordinates from a variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`RunConfig::from_lookup`], restricted to `GITHUB_TOKEN`,
    /// `PR_NUMBER` and `REPO_NAME`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DocscoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = require(RENDER_REQUIRED, &lookup)?;
        let [github_token, pr_number, repo]: [String; 3] = values
            .try_into()
            .map_err(|_| DocscoutError::Config("environment lookup mismatch".into()))?;
        let pr = Self {
            github_token,
            repo,
            number: parse_pr_number(&pr_number)?,
        };
        pr.owner_and_name()?;
        Ok(pr)
    }
}
