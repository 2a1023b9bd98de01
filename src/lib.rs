//! confluence-markdown-exporter - mirror Confluence spaces as Markdown
//!
//! This crate provides the core functionality for the `cme` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Credentials and instance URL from the environment
//! - [`confluence`] - REST API client and domain types
//! - [`state`] - State file model, persistence, and delta computation
//! - [`export`] - Markdown rendering and file layout
//! - [`sync`] - Scope replay and incremental sync execution
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod confluence;
pub mod error;
pub mod export;
pub mod state;
pub mod sync;

pub use error::{Error, Result};
