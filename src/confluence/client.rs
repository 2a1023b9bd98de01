//! HTTP client for the Confluence Cloud REST API.
//!
//! Thin wrapper over `reqwest` with basic auth and paged list handling.
//! Status mapping matters to the sync machinery: 403/404 responses become
//! errors the caller can classify as "permanently inaccessible", anything
//! else non-2xx is a transient failure.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{Error, Result};

use super::api::ConfluenceApi;
use super::types::{Ancestor, Page, Space};

/// Page size for paged list endpoints.
const LIST_LIMIT: usize = 100;

/// Expansions requested for a full page fetch.
const PAGE_EXPAND: &str = "body.export_view,version,space,ancestors,metadata.labels";

/// Confluence Cloud REST client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    username: String,
    api_token: String,
}

impl Client {
    /// Build a client for the configured instance.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/wiki/rest/api/{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .query(query)
            .send()
            .await
            .map_err(|e| Error::api(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api_status(
                status.as_u16(),
                format!("GET {url} returned {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::api(format!("Failed to parse response from {url}: {e}")))
    }

    /// Drain a paged list endpoint by advancing `start` until a short page.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut results = Vec::new();
        let mut start = 0usize;
        loop {
            let mut q: Vec<(&str, String)> = query.to_vec();
            q.push(("limit", LIST_LIMIT.to_string()));
            q.push(("start", start.to_string()));

            let page: PagedResponse<T> = self.get_json(path, &q).await?;
            let count = page.results.len();
            results.extend(page.results);
            if count < LIST_LIMIT {
                return Ok(results);
            }
            start += count;
        }
    }
}

impl ConfluenceApi for Client {
    async fn page(&self, id: &str) -> Result<Page> {
        let body: ContentResponse = self
            .get_json(
                &format!("content/{id}"),
                &[("expand", PAGE_EXPAND.to_string())],
            )
            .await?;
        Ok(body.into_page())
    }

    async fn page_version(&self, id: &str) -> Result<i64> {
        let body: ContentResponse = self
            .get_json(
                &format!("content/{id}"),
                &[("expand", "version".to_string())],
            )
            .await?;
        Ok(body.version.map_or(0, |v| v.number))
    }

    async fn descendant_ids(&self, id: &str) -> Result<Vec<String>> {
        let results: Vec<ContentRef> = self
            .get_paged(&format!("content/{id}/descendant/page"), &[])
            .await?;
        Ok(results.into_iter().map(|c| c.id).collect())
    }

    async fn space(&self, key: &str) -> Result<Space> {
        let body: SpaceResponse = self
            .get_json(
                &format!("space/{key}"),
                &[("expand", "homepage".to_string())],
            )
            .await?;
        Ok(body.into_space())
    }

    async fn all_spaces(&self) -> Result<Vec<Space>> {
        let results: Vec<SpaceResponse> = self
            .get_paged(
                "space",
                &[
                    ("type", "global".to_string()),
                    ("status", "current".to_string()),
                    ("expand", "homepage".to_string()),
                ],
            )
            .await?;
        Ok(results.into_iter().map(SpaceResponse::into_space).collect())
    }
}

// ── Wire payloads ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PagedResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ContentRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    id: String,
    title: String,
    version: Option<VersionInfo>,
    space: Option<SpaceRef>,
    ancestors: Option<Vec<AncestorRef>>,
    metadata: Option<Metadata>,
    body: Option<BodyField>,
}

impl ContentResponse {
    fn into_page(self) -> Page {
        Page {
            id: self.id,
            title: self.title,
            version: self.version.map_or(0, |v| v.number),
            space_key: self.space.map(|s| s.key).unwrap_or_default(),
            ancestors: self
                .ancestors
                .unwrap_or_default()
                .into_iter()
                .map(|a| Ancestor {
                    id: a.id,
                    title: a.title,
                })
                .collect(),
            labels: self
                .metadata
                .and_then(|m| m.labels)
                .map(|l| l.results.into_iter().map(|label| label.name).collect())
                .unwrap_or_default(),
            body_html: self
                .body
                .and_then(|b| b.export_view)
                .map(|v| v.value)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct SpaceRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct AncestorRef {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    labels: Option<LabelList>,
}

#[derive(Debug, Deserialize)]
struct LabelList {
    results: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BodyField {
    export_view: Option<BodyView>,
}

#[derive(Debug, Deserialize)]
struct BodyView {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SpaceResponse {
    key: String,
    name: String,
    homepage: Option<ContentRef>,
}

impl SpaceResponse {
    fn into_space(self) -> Space {
        Space {
            key: self.key,
            name: self.name,
            homepage_id: self.homepage.map(|h| h.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_response_maps_to_page() {
        let raw = r#"{
            "id": "12345",
            "title": "Getting Started",
            "version": {"number": 7},
            "space": {"key": "ENG"},
            "ancestors": [{"id": "100", "title": "Home"}],
            "metadata": {"labels": {"results": [{"name": "howto"}]}},
            "body": {"export_view": {"value": "<p>hello</p>"}}
        }"#;
        let page = serde_json::from_str::<ContentResponse>(raw)
            .unwrap()
            .into_page();

        assert_eq!(page.id, "12345");
        assert_eq!(page.version, 7);
        assert_eq!(page.space_key, "ENG");
        assert_eq!(page.ancestors.len(), 1);
        assert_eq!(page.labels, vec!["howto"]);
        assert_eq!(page.body_html, "<p>hello</p>");
    }

    #[test]
    fn missing_version_defaults_to_sentinel() {
        let raw = r#"{"id": "1", "title": "Bare"}"#;
        let page = serde_json::from_str::<ContentResponse>(raw)
            .unwrap()
            .into_page();
        assert_eq!(page.version, 0);
        assert!(page.body_html.is_empty());
    }

    #[test]
    fn space_response_maps_homepage() {
        let raw = r#"{"key": "ENG", "name": "Engineering", "homepage": {"id": "100"}}"#;
        let space = serde_json::from_str::<SpaceResponse>(raw)
            .unwrap()
            .into_space();
        assert_eq!(space.homepage_id.as_deref(), Some("100"));

        let raw = r#"{"key": "EMPTY", "name": "Empty"}"#;
        let space = serde_json::from_str::<SpaceResponse>(raw)
            .unwrap()
            .into_space();
        assert!(space.homepage_id.is_none());
    }
}
