use async_trait::async_trait;
use docscout_core::WikiConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{WikiApi, WikiError, WikiPage, WikiPageRef, WikiSpace};

/// Confluence Cloud REST client.
///
/// Requests go to `{base_url}/rest/api/...` with basic auth (username and
/// API token). The `reqwest::Client` is shared with the rest of the run, so
/// its timeout applies here too.
///
/// # Examples
///
/// ```
/// use docscout_core::WikiConfig;
/// use docscout_wiki::ConfluenceClient;
///
/// let client = ConfluenceClient::new(
///     reqwest::Client::new(),
///     "https://acme.atlassian.net/wiki/",
///     "bot@acme.io",
///     "token",
///     WikiConfig::default(),
/// );
/// assert_eq!(client.base_url(), "https://acme.atlassian.net/wiki");
/// ```
pub struct ConfluenceClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    api_token: String,
    limits: WikiConfig,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Listing<T> {
    #[serde(default)]
    results: Vec<T>,
}

#[derive(Deserialize)]
struct RawSpace {
    key: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct RawSpaceRef {
    key: Option<String>,
}

#[derive(Deserialize)]
struct RawContent {
    id: Option<String>,
    #[serde(default)]
    title: String,
    space: Option<RawSpaceRef>,
    body: Option<RawBody>,
    version: Option<RawVersion>,
    #[serde(rename = "statusCode")]
    status_code: Option<u16>,
}

#[derive(Deserialize)]
struct RawBody {
    storage: Option<RawStorage>,
}

#[derive(Deserialize)]
struct RawStorage {
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct RawVersion {
    number: u64,
}

impl RawContent {
    fn into_ref(self) -> Option<WikiPageRef> {
        Some(WikiPageRef {
            id: self.id?,
            title: self.title,
            space_key: self.space.and_then(|s| s.key),
        })
    }
}

impl ConfluenceClient {
    /// Create a client for the wiki at `base_url` (e.g. `https://acme.atlassian.net/wiki`).
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        username: &str,
        api_token: &str,
        limits: WikiConfig,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            api_token: api_token.to_string(),
            limits,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, WikiError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "confluence request");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| WikiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WikiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl WikiApi for ConfluenceClient {
    async fn spaces(&self) -> Result<Vec<WikiSpace>, WikiError> {
        let query = [
            ("start", "0".to_string()),
            ("limit", self.limits.space_limit.to_string()),
        ];
        let listing: Listing<RawSpace> = self.get_json("/rest/api/space", &query).await?;
        Ok(listing
            .results
            .into_iter()
            .map(|s| WikiSpace {
                key: s.key,
                name: s.name,
            })
            .collect())
    }

    async fn search(&self, cql: &str) -> Result<Vec<WikiPageRef>, WikiError> {
        let query = [
            ("cql", cql.to_string()),
            ("expand", "space".to_string()),
            ("limit", self.limits.search_limit.to_string()),
        ];
        let listing: Listing<RawContent> =
            self.get_json("/rest/api/content/search", &query).await?;
        Ok(listing
            .results
            .into_iter()
            .filter_map(RawContent::into_ref)
            .collect())
    }

    async fn page(&self, page_id: &str) -> Result<WikiPage, WikiError> {
        // Content ids are numeric; anything else would address another route.
        if page_id.is_empty() || !page_id.bytes().all(|b| b.is_ascii_digit()) {
            tracing::debug!(page_id, "rejecting non-numeric page id");
            return Err(WikiError::NotFound(page_id.to_string()));
        }
        let path = format!("/rest/api/content/{page_id}");
        let query = [("expand", "body.storage,space,version".to_string())];
        let raw: RawContent = match self.get_json(&path, &query).await {
            Ok(raw) => raw,
            Err(WikiError::Status { status: 404, .. }) => {
                return Err(WikiError::NotFound(page_id.to_string()))
            }
            Err(e) => return Err(e),
        };

        if raw.status_code.is_some_and(|code| code >= 400) {
            return Err(WikiError::NotFound(page_id.to_string()));
        }
        let Some(id) = raw.id else {
            return Err(WikiError::NotFound(page_id.to_string()));
        };

        Ok(WikiPage {
            id,
            title: raw.title,
            space_key: raw.space.and_then(|s| s.key),
            body: raw
                .body
                .and_then(|b| b.storage)
                .map(|s| s.value)
                .unwrap_or_default(),
            version: raw.version.map(|v| v.number),
        })
    }

    async fn pages_in_space(&self, space_key: &str) -> Result<Vec<WikiPageRef>, WikiError> {
        let query = [
            ("spaceKey", space_key.to_string()),
            ("type", "page".to_string()),
            ("start", "0".to_string()),
            ("limit", self.limits.page_limit.to_string()),
        ];
        let listing: Listing<RawContent> =
            self.get_json("/rest/api/content", &query).await?;
        Ok(listing
            .results
            .into_iter()
            .filter_map(RawContent::into_ref)
            .map(|mut page| {
                page.space_key.get_or_insert_with(|| space_key.to_string());
                page
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    fn client(url: &str) -> ConfluenceClient {
        ConfluenceClient::new(
            reqwest::Client::new(),
            url,
            "bot@acme.io",
            "token",
            WikiConfig::default(),
        )
    }

    #[tokio::test]
    async fn spaces_are_listed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/space".into()))
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[
                    {"id":1,"key":"ENG","name":"Engineering","type":"global"},
                    {"id":2,"key":"OPS","name":"Operations","type":"global"}
                ],"start":0,"limit":50,"size":2}"#,
            )
            .create_async()
            .await;

        let spaces = client(&server.url()).spaces().await.unwrap();
        mock.assert_async().await;
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].key, "ENG");
        assert_eq!(spaces[1].name, "Operations");
    }

    #[tokio::test]
    async fn search_maps_space_keys() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/content/search".into()))
            .match_query(Matcher::UrlEncoded(
                "cql".into(),
                "type=page AND text ~ \"export\"".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[{"id":"42","type":"page","title":"Export API","space":{"key":"ENG"}}]}"#,
            )
            .create_async()
            .await;

        let results = client(&server.url())
            .search("type=page AND text ~ \"export\"")
            .await
            .unwrap();
        assert_eq!(
            results,
            vec![WikiPageRef {
                id: "42".into(),
                title: "Export API".into(),
                space_key: Some("ENG".into()),
            }]
        );
    }

    #[tokio::test]
    async fn search_with_no_results_is_empty_not_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/content/search".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[],"size":0}"#)
            .create_async()
            .await;

        let results = client(&server.url()).search("title = nope").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn bad_cql_surfaces_status_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/content/search".into()))
            .with_status(400)
            .with_body(r#"{"statusCode":400,"message":"Could not parse cql"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).search("((").await.unwrap_err();
        assert!(matches!(err, WikiError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn page_includes_storage_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/content/123".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"123","type":"page","title":"Deploy guide",
                    "space":{"key":"OPS"},
                    "body":{"storage":{"value":"<p>Run make deploy</p>","representation":"storage"}},
                    "version":{"number":7}}"#,
            )
            .create_async()
            .await;

        let page = client(&server.url()).page("123").await.unwrap();
        assert_eq!(page.title, "Deploy guide");
        assert_eq!(page.space_key.as_deref(), Some("OPS"));
        assert_eq!(page.body, "<p>Run make deploy</p>");
        assert_eq!(page.version, Some(7));
    }

    #[tokio::test]
    async fn missing_page_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/content/999".into()))
            .with_status(404)
            .with_body(r#"{"statusCode":404,"message":"No content found with id 999"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).page("999").await.unwrap_err();
        assert!(matches!(err, WikiError::NotFound(id) if id == "999"));
    }

    #[tokio::test]
    async fn error_flagged_page_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/content/555".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"statusCode":403,"message":"forbidden"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).page("555").await.unwrap_err();
        assert!(matches!(err, WikiError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_numeric_page_id_is_not_requested() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .expect(0)
            .create_async()
            .await;

        let client = client(&server.url());
        for id in ["../space", "1?expand=x", "12/children", ""] {
            let err = client.page(id).await.unwrap_err();
            assert!(matches!(err, WikiError::NotFound(ref got) if got == id));
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn pages_in_space_default_the_space_key() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/content".into()))
            .match_query(Matcher::UrlEncoded("spaceKey".into(), "ENG".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[{"id":"1","title":"Home"},{"id":"2","title":"API"}]}"#)
            .create_async()
            .await;

        let pages = client(&server.url()).pages_in_space("ENG").await.unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.space_key.as_deref() == Some("ENG")));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let err = client("http://127.0.0.1:1").spaces().await.unwrap_err();
        assert!(matches!(err, WikiError::Transport(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/rest/api/space".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json")
            .create_async()
            .await;

        let err = client(&server.url()).spaces().await.unwrap_err();
        assert!(matches!(err, WikiError::Decode(_)));
    }
}
