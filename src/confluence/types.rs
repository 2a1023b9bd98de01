//! Domain types for the Confluence REST API.
//!
//! These are the shapes the rest of the crate works with; the raw wire
//! payloads live next to the HTTP client and are converted on arrival.

/// A fully fetched Confluence page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Content id, stable across versions.
    pub id: String,
    pub title: String,
    /// Version number, incremented by Confluence on every edit.
    pub version: i64,
    /// Key of the space the page lives in.
    pub space_key: String,
    /// Ancestor chain from the space root down to the direct parent.
    pub ancestors: Vec<Ancestor>,
    /// Label names attached to the page.
    pub labels: Vec<String>,
    /// Rendered export-view HTML body.
    pub body_html: String,
}

/// One entry in a page's ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    pub id: String,
    pub title: String,
}

/// A Confluence space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub key: String,
    pub name: String,
    /// The space homepage, if one is set. Page enumeration goes through it.
    pub homepage_id: Option<String>,
}
