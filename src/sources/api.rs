use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};

use super::{CatalogSource, SourceError, parse_model_list};
use crate::{
    catalog::{RawModel, SourceTag},
    config::UpstreamConfig,
};

/// Live upstream aggregator endpoint.
#[derive(Debug, Clone)]
pub struct ApiSource {
    client: Client,
    url: String,
    timeout: Duration,
    api_key: Option<String>,
    enabled: bool,
}

impl ApiSource {
    /// Build a source from configuration, with its own HTTP client.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, SourceError> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self::with_client(config, client))
    }

    /// Build a source that shares an existing HTTP client.
    pub fn with_client(config: &UpstreamConfig, client: Client) -> Self {
        Self {
            client,
            url: config.api_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            enabled: config.enabled,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the response body without parsing it.
    pub async fn fetch_body(&self) -> Result<String, SourceError> {
        if !self.enabled {
            return Err(SourceError::Disabled);
        }

        let mut request = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .header(header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl CatalogSource for ApiSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Api
    }

    async fn fetch_raw(&self) -> Result<Vec<RawModel>, SourceError> {
        let body = self.fetch_body().await?;
        let models = parse_model_list(&body)?;

        tracing::debug!(
            url = %self.url,
            model_count = models.len(),
            "Fetched model list from upstream"
        );

        Ok(models)
    }
}
