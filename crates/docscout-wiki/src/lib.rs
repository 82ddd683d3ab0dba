//! Read-only access to a Confluence wiki.
//!
//! [`WikiApi`] is the seam the agent tools are written against;
//! [`ConfluenceClient`] implements it over the Confluence Cloud REST API.

pub mod confluence;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use confluence::ConfluenceClient;

/// Failure of a single wiki operation.
///
/// Every operation reports failure through this type instead of an empty
/// result, so callers can tell "nothing matched" from "the call broke".
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Confluence API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The requested page does not exist or is flagged as an error.
    #[error("page '{0}' not found")]
    NotFound(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<WikiError> for docscout_core::DocscoutError {
    fn from(err: WikiError) -> Self {
        docscout_core::DocscoutError::Wiki(err.to_string())
    }
}

/// A Confluence space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSpace {
    pub key: String,
    pub name: String,
}

/// A page as it appears in search results and space listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPageRef {
    pub id: String,
    pub title: String,
    pub space_key: Option<String>,
}

/// A page with its storage-format body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPage {
    pub id: String,
    pub title: String,
    pub space_key: Option<String>,
    /// Body in Confluence storage format (XHTML).
    pub body: String,
    pub version: Option<u64>,
}

/// The four read operations the documentation agent may use.
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// List the spaces visible to the configured user.
    async fn spaces(&self) -> Result<Vec<WikiSpace>, WikiError>;

    /// Run a CQL query and return matching content.
    async fn search(&self, cql: &str) -> Result<Vec<WikiPageRef>, WikiError>;

    /// Fetch a page by id, including its body.
    async fn page(&self, page_id: &str) -> Result<WikiPage, WikiError>;

    /// List pages in a space.
    async fn pages_in_space(&self, space_key: &str) -> Result<Vec<WikiPageRef>, WikiError>;
}

#[cfg(test)]
mod tests {
    use docscout_core::DocscoutError;

    use super::*;

    #[test]
    fn status_error_shows_code_and_body() {
        let err = WikiError::Status {
            status: 401,
            body: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "Confluence API error 401: Unauthorized");
    }

    #[test]
    fn converts_into_docscout_error() {
        let err: DocscoutError = WikiError::NotFound("12".into()).into();
        assert!(matches!(err, DocscoutError::Wiki(msg) if msg == "page '12' not found"));
    }
}
