use crate::core::error::FetchError;
use crate::core::models::ResourceKey;
use crate::transport::Fetcher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

const MAX_ERROR_BODY_LEN: usize = 256;

/// JSON-over-HTTP fetch collaborator used by the CLI: one GET per issued
/// fetch, decoded as an arbitrary JSON document.
pub struct RestFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl RestFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn request_url(&self, key: &ResourceKey) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = key.path().trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

#[async_trait]
impl Fetcher for RestFetcher {
    type Output = serde_json::Value;

    async fn issue(&self, key: &ResourceKey) -> Result<Self::Output, FetchError> {
        let url = self.request_url(key);
        tracing::debug!(%url, "Issuing fetch");

        let response = self
            .client
            .get(&url)
            .query(key.params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(MAX_ERROR_BODY_LEN);
            return Err(FetchError::failed(format!("{status} - {body}")));
        }

        let value = response.json::<serde_json::Value>().await?;
        Ok(value)
    }
}
