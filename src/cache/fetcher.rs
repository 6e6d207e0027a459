//! Fetching cache misses by hash

use crate::config::ClientConfig;
use crate::error::{ApiError, CacheError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of payloads the local cache does not hold.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    /// Return the raw encoded message whose content hash is `hash`.
    async fn fetch_by_hash(&self, hash: &str) -> Result<Vec<u8>, CacheError>;
}

/// Fetches payloads with `GET {endpoint}?hash=<hash>`.
#[derive(Debug, Clone)]
pub struct HttpPayloadFetcher {
    client: Client,
    endpoint: String,
}

impl HttpPayloadFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Build a fetcher when the configuration names a message endpoint.
    pub fn from_config(config: &ClientConfig) -> Result<Option<Self>, ApiError> {
        config
            .message_endpoint
            .as_ref()
            .map(|endpoint| {
                Self::new(
                    endpoint.clone(),
                    Duration::from_millis(config.fetch_timeout_ms),
                )
            })
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PayloadFetcher for HttpPayloadFetcher {
    async fn fetch_by_hash(&self, hash: &str) -> Result<Vec<u8>, CacheError> {
        debug!(hash, endpoint = %self.endpoint, "Fetching uncached message");
        let fetch_error = |reason: String| CacheError::Fetch {
            hash: hash.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("hash", hash)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(hash, "Message fetch failed: {}", e);
                fetch_error(e.to_string())
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
