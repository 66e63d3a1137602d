use crate::constants::{API_URL_ENV, COMPRESS_PATH, DEFAULT_API_URL, HEALTH_PATH};
use crate::error::{CompressionError, Result};
use reqwest::Url;

/// Location of the remote compression service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Build a config from an optional override, falling back to the
    /// development default.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let raw = base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let trimmed = raw.trim_end_matches('/').to_string();
        Url::parse(&trimmed)
            .map_err(|e| CompressionError::InvalidBaseUrl(raw.clone(), e.to_string()))?;

        Ok(Self { base_url: trimmed })
    }

    /// Read the base URL from `PCA_API_URL`, falling back to the default
    /// when it is unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(API_URL_ENV).ok())
    }

    pub fn compress_url(&self) -> String {
        format!("{}{}", self.base_url, COMPRESS_PATH)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, HEALTH_PATH)
    }
}
