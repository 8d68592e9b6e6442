//! Search client configuration.

use glossa_core::defaults::{SEARCH_ALIAS, SEARCH_INDEX, SEARCH_TIMEOUT_SECS, SEARCH_URL};
use glossa_core::{Error, Result};

/// Connection settings for the search engine.
///
/// Environment variables read by [`SearchConfig::from_env`]:
///   SEARCH_URL      - base URL (default: http://127.0.0.1:9200)
///   SEARCH_INDEX    - glossary term index (default: glossary_term_search_index)
///   SEARCH_ALIAS    - alias spanning every entity index (default: all)
///   SEARCH_TIMEOUT  - request timeout in seconds (default: 30)
///   SEARCH_API_KEY  - sent as `Authorization: ApiKey <key>` when set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub base_url: String,
    pub index: String,
    /// Alias queried when stripping or flagging labels on other documents.
    pub alias: String,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: SEARCH_URL.to_string(),
            index: SEARCH_INDEX.to_string(),
            alias: SEARCH_ALIAS.to_string(),
            timeout_seconds: SEARCH_TIMEOUT_SECS,
            api_key: None,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SEARCH_URL").unwrap_or(defaults.base_url),
            index: std::env::var("SEARCH_INDEX").unwrap_or(defaults.index),
            alias: std::env::var("SEARCH_ALIAS").unwrap_or(defaults.alias),
            timeout_seconds: std::env::var("SEARCH_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
            api_key: std::env::var("SEARCH_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds.max(1);
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "search base URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.index.is_empty() || self.alias.is_empty() {
            return Err(Error::Config(
                "search index and alias must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:9200");
        assert_eq!(config.index, "glossary_term_search_index");
        assert_eq!(config.alias, "all");
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = SearchConfig::default()
            .with_base_url("https://search.internal:9200")
            .with_index("terms")
            .with_alias("everything")
            .with_timeout(0)
            .with_api_key("secret");

        assert_eq!(config.base_url, "https://search.internal:9200");
        assert_eq!(config.index, "terms");
        assert_eq!(config.alias, "everything");
        assert_eq!(config.timeout_seconds, 1);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = SearchConfig::default().with_base_url("localhost:9200");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = SearchConfig::default().with_index("");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
