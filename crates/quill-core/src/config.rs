//! Remote store configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming the remote document API endpoint
pub const REMOTE_URL_ENV: &str = "QUILL_REMOTE_URL";
/// Environment variable holding the bearer token for the remote API
pub const REMOTE_TOKEN_ENV: &str = "QUILL_REMOTE_TOKEN";

/// Connection settings for the remote document store.
///
/// The endpoint is normalized on construction (trimmed, `http(s)://` scheme
/// required, trailing slash stripped).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub auth_token: Option<String>,
}

impl RemoteConfig {
    /// Create a config for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint.into())?,
            auth_token: None,
        })
    }

    /// Attach a bearer token
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Load from `QUILL_REMOTE_URL` / `QUILL_REMOTE_TOKEN`.
    ///
    /// Returns `Ok(None)` when no endpoint is set (local-only mode).
    pub fn from_env() -> Result<Option<Self>> {
        let Some(endpoint) = normalize_text_option(std::env::var(REMOTE_URL_ENV).ok()) else {
            return Ok(None);
        };
        let mut config = Self::new(endpoint)?;
        if let Some(token) = normalize_text_option(std::env::var(REMOTE_TOKEN_ENV).ok()) {
            config = config.with_auth_token(token);
        }
        Ok(Some(config))
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Trim a candidate value, mapping blank/absent to `None`
#[must_use]
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn normalize_endpoint(raw: String) -> Result<String> {
    let endpoint = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Validation("endpoint must not be empty".to_string()))?;
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::Validation(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_endpoint_rejects_invalid_values() {
        assert!(RemoteConfig::new("").is_err());
        assert!(RemoteConfig::new("   ").is_err());
        assert!(RemoteConfig::new("api.example.com").is_err());
    }

    #[test]
    fn normalize_endpoint_trims_trailing_slash() {
        let config = RemoteConfig::new(" https://api.example.com/v1/ ").unwrap();
        assert_eq!(config.endpoint, "https://api.example.com/v1");
    }

    #[test]
    fn normalize_text_option_drops_blanks() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("  ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" value ".to_string())),
            Some("value".to_string())
        );
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = RemoteConfig::new("https://api.example.com")
            .unwrap()
            .with_auth_token("secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
    }
}
