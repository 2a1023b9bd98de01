//! In-memory Confluence fake for unit tests.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

use super::api::ConfluenceApi;
use super::types::{Page, Space};

/// Canned-response implementation of [`ConfluenceApi`].
///
/// Ids listed in `denied` answer 404 everywhere; ids in `failing` answer
/// 500 so callers can exercise the transient-failure path.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub pages: HashMap<String, Page>,
    pub descendants: HashMap<String, Vec<String>>,
    pub spaces: HashMap<String, Space>,
    pub space_list: Vec<Space>,
    pub denied: HashSet<String>,
    pub failing: HashSet<String>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page with a stub body and no ancestors. Returns the stored
    /// page so tests can adjust its fields.
    pub fn add_page(&mut self, id: &str, title: &str, version: i64, space_key: &str) -> &mut Page {
        self.pages.insert(
            id.to_string(),
            Page {
                id: id.to_string(),
                title: title.to_string(),
                version,
                space_key: space_key.to_string(),
                ancestors: Vec::new(),
                labels: Vec::new(),
                body_html: format!("<p>{title}</p>"),
            },
        );
        self.pages.get_mut(id).expect("just inserted")
    }

    /// Answer 404 for this id on every endpoint.
    pub fn deny(&mut self, id: &str) {
        self.denied.insert(id.to_string());
    }

    /// Answer 500 for this id on every endpoint.
    pub fn fail(&mut self, id: &str) {
        self.failing.insert(id.to_string());
    }

    /// Register a space and add it to the organization listing.
    pub fn add_space(&mut self, key: &str, name: &str, homepage_id: Option<&str>) {
        let space = Space {
            key: key.to_string(),
            name: name.to_string(),
            homepage_id: homepage_id.map(str::to_string),
        };
        self.spaces.insert(key.to_string(), space.clone());
        self.space_list.push(space);
    }

    fn check_reachable(&self, id: &str) -> Result<()> {
        if self.denied.contains(id) {
            return Err(Error::api_status(404, format!("page {id} not found")));
        }
        if self.failing.contains(id) {
            return Err(Error::api_status(500, format!("page {id} errored")));
        }
        Ok(())
    }
}

impl ConfluenceApi for FakeApi {
    async fn page(&self, id: &str) -> Result<Page> {
        self.check_reachable(id)?;
        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| Error::api_status(404, format!("page {id} not found")))
    }

    async fn page_version(&self, id: &str) -> Result<i64> {
        self.check_reachable(id)?;
        self.pages
            .get(id)
            .map(|p| p.version)
            .ok_or_else(|| Error::api_status(404, format!("page {id} not found")))
    }

    async fn descendant_ids(&self, id: &str) -> Result<Vec<String>> {
        self.check_reachable(id)?;
        Ok(self.descendants.get(id).cloned().unwrap_or_default())
    }

    async fn space(&self, key: &str) -> Result<Space> {
        self.spaces
            .get(key)
            .cloned()
            .ok_or_else(|| Error::api_status(404, format!("space {key} not found")))
    }

    async fn all_spaces(&self) -> Result<Vec<Space>> {
        Ok(self.space_list.clone())
    }
}
