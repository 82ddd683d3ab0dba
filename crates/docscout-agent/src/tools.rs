//! Confluence tools offered to the documentation agent.
//!
//! Each tool wraps one [`WikiApi`] operation and hands the model a small JSON
//! projection of the result instead of the raw payload. Failures come back
//! as [`ToolRetry`] so the agent loop can show the cause to the model and let
//! it try again with different arguments.

use async_trait::async_trait;
use docscout_wiki::{WikiApi, WikiError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::llm::ToolDefinition;

/// A tool failure the model should see and react to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ToolRetry(pub String);

/// A set of callable tools.
#[async_trait]
pub trait Toolset: Send + Sync {
    /// Tools to declare in the request.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run the tool `name` with JSON-encoded `arguments`.
    async fn call(&self, name: &str, arguments: &str) -> Result<String, ToolRetry>;
}

pub const GET_SPACES: &str = "get_confluence_spaces";
pub const SEARCH_CQL: &str = "search_confluence_using_cql";
pub const GET_PAGE: &str = "get_confluence_page";
pub const PAGES_IN_SPACE: &str = "get_pages_in_confluence_space";

/// Returned instead of an empty list so the model reads it as prose.
pub const NO_RESULTS: &str = "No pages found for this CQL query.";

/// Arguments of `search_confluence_using_cql`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// CQL query, e.g. `type=page AND text ~ "export API"`.
    pub cql: String,
}

/// Arguments of `get_confluence_page`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PageParams {
    /// Confluence page ID.
    pub page_id: String,
}

/// Arguments of `get_pages_in_confluence_space`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SpaceParams {
    /// Confluence space key, e.g. `ENG`.
    pub space_key: String,
}

#[derive(Serialize)]
struct SpaceEntry<'a> {
    key: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct SearchEntry<'a> {
    id: &'a str,
    title: &'a str,
    space: Option<&'a str>,
}

#[derive(Serialize)]
struct PageEntry<'a> {
    id: &'a str,
    title: &'a str,
}

#[derive(Serialize)]
struct PagePreview<'a> {
    id: &'a str,
    title: &'a str,
    content_preview: String,
}

/// JSON Schema for `T` without the `$schema` marker.
pub(crate) fn schema_value<T: JsonSchema>() -> serde_json::Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(map) = value.as_object_mut() {
        map.remove("$schema");
    }
    value
}

fn no_params() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

fn parse_args<'de, T: Deserialize<'de>>(tool: &str, arguments: &'de str) -> Result<T, ToolRetry> {
    serde_json::from_str(arguments)
        .map_err(|e| ToolRetry(format!("Invalid arguments for {tool}: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ToolRetry> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ToolRetry(format!("Failed to encode tool output: {e}")))
}

/// Read-only Confluence tools backed by a [`WikiApi`].
pub struct WikiToolkit<'a> {
    wiki: &'a dyn WikiApi,
    preview_chars: usize,
}

impl<'a> WikiToolkit<'a> {
    /// Create a toolkit that previews at most `preview_chars` characters of
    /// each fetched page.
    pub fn new(wiki: &'a dyn WikiApi, preview_chars: usize) -> Self {
        Self {
            wiki,
            preview_chars,
        }
    }

    async fn spaces(&self) -> Result<String, ToolRetry> {
        tracing::info!("getting Confluence spaces");
        let spaces = self
            .wiki
            .spaces()
            .await
            .map_err(|e| ToolRetry(format!("Error getting Confluence spaces: {e}")))?;
        let entries: Vec<SpaceEntry<'_>> = spaces
            .iter()
            .map(|s| SpaceEntry {
                key: &s.key,
                name: &s.name,
            })
            .collect();
        to_json(&entries)
    }

    async fn search(&self, params: SearchParams) -> Result<String, ToolRetry> {
        tracing::info!(cql = %params.cql, "searching Confluence");
        let results = self.wiki.search(&params.cql).await.map_err(|e| {
            ToolRetry(format!(
                "Error searching Confluence with CQL '{}': {e}",
                params.cql
            ))
        })?;
        if results.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }
        let entries: Vec<SearchEntry<'_>> = results
            .iter()
            .map(|r| SearchEntry {
                id: &r.id,
                title: &r.title,
                space: r.space_key.as_deref(),
            })
            .collect();
        to_json(&entries)
    }

    async fn page(&self, params: PageParams) -> Result<String, ToolRetry> {
        tracing::info!(page_id = %params.page_id, "getting Confluence page");
        let page = self.wiki.page(&params.page_id).await.map_err(|e| match e {
            WikiError::NotFound(_) => ToolRetry(format!(
                "Page with ID '{}' not found or error retrieving it.",
                params.page_id
            )),
            other => ToolRetry(format!(
                "Error getting Confluence page '{}': {other}",
                params.page_id
            )),
        })?;
        to_json(&PagePreview {
            id: &page.id,
            title: &page.title,
            content_preview: page.body.chars().take(self.preview_chars).collect(),
        })
    }

    async fn pages_in_space(&self, params: SpaceParams) -> Result<String, ToolRetry> {
        tracing::info!(space_key = %params.space_key, "listing pages in Confluence space");
        let pages = self
            .wiki
            .pages_in_space(&params.space_key)
            .await
            .map_err(|e| {
                ToolRetry(format!(
                    "Error listing pages in space '{}': {e}",
                    params.space_key
                ))
            })?;
        let entries: Vec<PageEntry<'_>> = pages
            .iter()
            .map(|p| PageEntry {
                id: &p.id,
                title: &p.title,
            })
            .collect();
        to_json(&entries)
    }
}

#[async_trait]
impl Toolset for WikiToolkit<'_> {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: GET_SPACES.into(),
                description: "Get all available Confluence spaces with their keys and names."
                    .into(),
                parameters: no_params(),
            },
            ToolDefinition {
                name: SEARCH_CQL.into(),
                description: "Search Confluence using a CQL query string.".into(),
                parameters: schema_value::<SearchParams>(),
            },
            ToolDefinition {
                name: GET_PAGE.into(),
                description: "Get detailed content of a specific Confluence page by its ID."
                    .into(),
                parameters: schema_value::<PageParams>(),
            },
            ToolDefinition {
                name: PAGES_IN_SPACE.into(),
                description: "List pages in a Confluence space by its key.".into(),
                parameters: schema_value::<SpaceParams>(),
            },
        ]
    }

    async fn call(&self, name: &str, arguments: &str) -> Result<String, ToolRetry> {
        match name {
            GET_SPACES => self.spaces().await,
            SEARCH_CQL => self.search(parse_args(name, arguments)?).await,
            GET_PAGE => self.page(parse_args(name, arguments)?).await,
            PAGES_IN_SPACE => self.pages_in_space(parse_args(name, arguments)?).await,
            other => Err(ToolRetry(format!(
                "Unknown tool '{other}'. Available tools: {GET_SPACES}, {SEARCH_CQL}, {GET_PAGE}, {PAGES_IN_SPACE}."
            ))),
        }
    }
}
