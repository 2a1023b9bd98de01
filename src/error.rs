//! Error types for the exporter CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (1=usage, 2=state, 3=config, etc.)
//! - Context-aware recovery hints printed under the error message

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the exit code; humans read the hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Usage (exit 1)
    StateExists,
    NoState,
    InternalError,

    // State file (exit 2)
    CorruptState,
    SourceMismatch,

    // Config (exit 3)
    ConfigError,

    // Remote API (exit 4)
    ApiError,

    // I/O (exit 5)
    IoError,
    JsonError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::StateExists => "STATE_EXISTS",
            Self::NoState => "NO_STATE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::CorruptState => "CORRUPT_STATE",
            Self::SourceMismatch => "SOURCE_MISMATCH",
            Self::ConfigError => "CONFIG_ERROR",
            Self::ApiError => "API_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }

    /// Category-based exit code (1-5).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::StateExists | Self::NoState | Self::InternalError => 1,
            Self::CorruptState | Self::SourceMismatch => 2,
            Self::ConfigError => 3,
            Self::ApiError => 4,
            Self::IoError | Self::JsonError => 5,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in exporter operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("A state file already exists in {}", path.display())]
    StateExists { path: PathBuf },

    #[error("No state file found in {}", path.display())]
    NoState { path: PathBuf },

    #[error("State file {} is invalid: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("Confluence URL mismatch: state file has '{stored}' but current configuration has '{current}'")]
    SourceMismatch { stored: String, current: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API request failed: {message}")]
    Api { status: Option<u16>, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an API error from an HTTP status and context message.
    #[must_use]
    pub fn api_status(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build an API error with no HTTP status (transport failures).
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this error means the entity is permanently inaccessible
    /// (forbidden or gone) rather than transiently unavailable.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::Api {
                status: Some(403 | 404),
                ..
            }
        )
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::StateExists { .. } => ErrorCode::StateExists,
            Self::NoState { .. } => ErrorCode::NoState,
            Self::CorruptState { .. } => ErrorCode::CorruptState,
            Self::SourceMismatch { .. } => ErrorCode::SourceMismatch,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Api { .. } => ErrorCode::ApiError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for the user.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::StateExists { .. } => Some(
                "Use `--append` to add this scope to the existing export, \
                 or run `cme sync` to update it"
                    .to_string(),
            ),

            Self::NoState { .. } => Some(
                "Run an export command first (`cme pages`, `cme spaces`, ...) \
                 to create one"
                    .to_string(),
            ),

            Self::CorruptState { path, .. } => Some(format!(
                "The file was left untouched. Repair or remove {} and re-export.",
                path.display()
            )),

            Self::SourceMismatch { .. } => Some(
                "If this is the same Confluence instance (e.g. after a domain \
                 rename or config correction), re-run with --force to update \
                 the stored URL"
                    .to_string(),
            ),

            Self::Config(_) => Some(
                "Set ATLASSIAN_URL, ATLASSIAN_USERNAME and ATLASSIAN_API_TOKEN \
                 in the environment"
                    .to_string(),
            ),

            Self::Api { status, .. } => match status {
                Some(401) => Some(
                    "Check ATLASSIAN_USERNAME and ATLASSIAN_API_TOKEN".to_string(),
                ),
                _ => None,
            },

            Self::Io(_) | Self::Json(_) => None,
        }
    }
}
