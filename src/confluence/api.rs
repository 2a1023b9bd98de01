//! Confluence API trait.
//!
//! Defines the remote operations the replayer and export pipeline need.
//! Async methods follow the sequential-await model: callers issue one
//! request at a time, never a parallel fan-out.

use crate::error::Result;

use super::types::{Page, Space};

/// Read access to a Confluence instance.
///
/// Implemented by the HTTP [`Client`](super::Client) and by an in-memory
/// fake in tests.
pub trait ConfluenceApi: Send + Sync {
    /// Fetch a page with body, ancestors, and labels.
    fn page(&self, id: &str) -> impl std::future::Future<Output = Result<Page>> + Send;

    /// Fetch only a page's current version number (no body download).
    ///
    /// Returns `0` when the response carries no version field.
    fn page_version(&self, id: &str) -> impl std::future::Future<Output = Result<i64>> + Send;

    /// List the ids of all descendant pages below a page.
    fn descendant_ids(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;

    /// Fetch a space by key, including its homepage reference.
    fn space(&self, key: &str) -> impl std::future::Future<Output = Result<Space>> + Send;

    /// List every current global space in the organization.
    fn all_spaces(&self) -> impl std::future::Future<Output = Result<Vec<Space>>> + Send;

    /// All page ids in a space: the homepage plus its descendants.
    ///
    /// A space without a homepage has no reachable pages and yields an
    /// empty list.
    fn space_page_ids(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send {
        async move {
            let space = self.space(key).await?;
            let Some(homepage_id) = space.homepage_id else {
                return Ok(Vec::new());
            };
            let mut ids = vec![homepage_id.clone()];
            ids.extend(self.descendant_ids(&homepage_id).await?);
            Ok(ids)
        }
    }
}
