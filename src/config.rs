//! Configuration from the environment.
//!
//! Credentials and the instance URL come from `ATLASSIAN_*` environment
//! variables. There is no config file: the state file in the output
//! directory carries everything else the tool needs to remember.

use crate::error::{Error, Result};

/// Environment variable holding the Confluence instance URL.
pub const ENV_URL: &str = "ATLASSIAN_URL";
/// Environment variable holding the account email.
pub const ENV_USERNAME: &str = "ATLASSIAN_USERNAME";
/// Environment variable holding the API token.
pub const ENV_API_TOKEN: &str = "ATLASSIAN_API_TOKEN";

/// Connection settings for one Confluence Cloud instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Instance base URL without a trailing slash,
    /// e.g. `https://example.atlassian.net`.
    pub base_url: String,
    /// Account email for HTTP basic auth.
    pub username: String,
    /// API token paired with the username.
    pub api_token: String,
}

impl Config {
    /// Build a config, normalizing the base URL.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            api_token: api_token.into(),
        }
    }

    /// Load connection settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing or empty variable.
    pub fn from_env() -> Result<Self> {
        let base_url = require_env(ENV_URL)?;
        let username = require_env(ENV_USERNAME)?;
        let api_token = require_env(ENV_API_TOKEN)?;
        Ok(Self::new(base_url, username, api_token))
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::Config(format!("{name} is not set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_trailing_slashes() {
        let config = Config::new("https://example.atlassian.net//", "me@example.com", "tok");
        assert_eq!(config.base_url, "https://example.atlassian.net");
    }

    #[test]
    fn missing_env_var_names_the_variable() {
        let err = require_env("CME_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("CME_TEST_UNSET_VARIABLE"));
    }
}
