/// Errors that can occur across docscout.
///
/// Library crates use this type directly; the binary crate converts to
/// `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use docscout_core::DocscoutError;
///
/// let err = DocscoutError::MissingEnv(vec!["GITHUB_TOKEN".into(), "PR_NUMBER".into()]);
/// assert!(err.to_string().contains("GITHUB_TOKEN, PR_NUMBER"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DocscoutError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    #[diagnostic(code(docscout::config))]
    Config(String),

    /// One or more required environment variables are unset or empty.
    #[error("missing required environment variables: {}", .0.join(", "))]
    #[diagnostic(
        code(docscout::config::missing_env),
        help("set them in the workflow's `env:` block; PR_BODY is the only optional one")
    )]
    MissingEnv(Vec<String>),

    /// Input records that do not have the expected shape.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Confluence API failure outside the agent tool loop.
    #[error("wiki error: {0}")]
    Wiki(String),

    /// GitHub API failure.
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// LLM API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// A structured result that violates the analysis schema.
    #[error("schema violation: {0}")]
    Schema(String),

    /// The agent exchange ran out of retries or turns.
    #[error("agent gave up: {0}")]
    #[diagnostic(
        code(docscout::agent::exhausted),
        help("rerun the job, or raise `max_retries` / `max_turns` under [llm] in .docscout.toml")
    )]
    Exhausted(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(docscout::config::toml), help("check the syntax of .docscout.toml"))]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DocscoutError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn missing_env_lists_every_name() {
        let err = DocscoutError::MissingEnv(vec![
            "OPENAI_API_KEY".into(),
            "CONFLUENCE_URL".into(),
            "REPO_NAME".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "missing required environment variables: OPENAI_API_KEY, CONFLUENCE_URL, REPO_NAME"
        );
    }

    #[test]
    fn schema_error_displays_message() {
        let err = DocscoutError::Schema("total_actions is 3 but 2 actions were returned".into());
        assert!(err.to_string().starts_with("schema violation:"));
    }
}
