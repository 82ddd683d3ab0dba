//! GitHub access: listing a pull request's changed files and posting
//! issue comments on it.

use docscout_core::{DocscoutError, FileChange};

/// GitHub client for fetching PR file lists and posting comments.
///
/// File lists are fetched with plain `reqwest` against the REST endpoint;
/// comments go through `octocrab`.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    api_url: String,
}

impl GitHubClient {
    /// Create a client for the API rooted at `api_url`.
    ///
    /// Must be called from inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::GitHub`] if the octocrab client cannot be
    /// built, e.g. because `api_url` is not a valid URI.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use docscout_github::GitHubClient;
    ///
    /// # async fn example() -> Result<(), docscout_core::DocscoutError> {
    /// let client = GitHubClient::new(reqwest::Client::new(), "ghp_xxxx", "https://api.github.com")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(http: reqwest::Client, token: &str, api_url: &str) -> Result<Self, DocscoutError> {
        let api_url = api_url.trim_end_matches('/').to_string();
        let octocrab = octocrab::Octocrab::builder()
            .base_uri(api_url.as_str())
            .map_err(|e| DocscoutError::GitHub(format!("invalid GitHub API URL: {e}")))?
            .personal_token(token.to_string())
            .build()
            .map_err(|e| DocscoutError::GitHub(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            http,
            token: token.to_string(),
            api_url,
        })
    }

    /// List the files changed by a pull request.
    ///
    /// HTTP and transport failures are logged and reported as an empty list;
    /// callers must treat an empty list as "could not fetch" and stop.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::Validation`] when GitHub answers successfully
    /// but the records lack `filename`, `additions` or `deletions`.
    pub async fn pr_files(
        &self,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<FileChange>, DocscoutError> {
        let url = format!("{}/repos/{repo}/pulls/{pr_number}/files", self.api_url);

        let response = match self
            .http
            .get(&url)
            .query(&[("per_page", "100")])
            .header("Accept", "application/vnd.github.v3+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "docscout")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch PR files");
                return Ok(Vec::new());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "failed to read PR files response");
                return Ok(Vec::new());
            }
        };
        if !status.is_success() {
            tracing::error!(%status, %body, "GitHub API error");
            return Ok(Vec::new());
        }

        serde_json::from_str(&body)
            .map_err(|e| DocscoutError::Validation(format!("malformed PR file record: {e}")))
    }

    /// Post `body` as a new comment on the pull request's conversation.
    ///
    /// # Errors
    ///
    /// Returns [`DocscoutError::GitHub`] on API errors.
    pub async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<(), DocscoutError> {
        let route = format!("/repos/{owner}/{repo}/issues/{pr_number}/comments");
        let payload = serde_json::json!({ "body": body });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| DocscoutError::GitHub(format!("failed to post comment: {e}")))?;
        Ok(())
    }
}
