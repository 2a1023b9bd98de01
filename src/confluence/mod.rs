//! Confluence REST API access.
//!
//! The [`ConfluenceApi`] trait is the seam between the sync machinery and
//! the network: production code uses the `reqwest`-backed [`Client`],
//! tests use an in-memory fake.

mod api;
mod client;
#[cfg(test)]
pub mod fake;
mod types;

pub use api::ConfluenceApi;
pub use client::Client;
pub use types::{Ancestor, Page, Space};
