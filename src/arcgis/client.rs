//! Outbound fetch against the remote geodata service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::query::QueryRequest;
use crate::config::Settings;
use crate::error::ConnectorError;

/// Performs one GET and returns the decoded JSON body.
///
/// Implementations must not retry; the dispatcher relies on exactly one
/// call per tool invocation.
#[async_trait]
pub trait GeoFetcher: Send + Sync {
    async fn fetch(&self, request: &QueryRequest) -> Result<Value, ConnectorError>;
}

/// reqwest-backed fetcher. The token travels as a plain query parameter,
/// so transport errors are stripped of the request URL.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GeoFetcher for HttpFetcher {
    async fn fetch(&self, request: &QueryRequest) -> Result<Value, ConnectorError> {
        let response = self
            .client
            .get(&request.url)
            .query(&request.params)
            .send()
            .await
            .map_err(|e| ConnectorError::from(e.without_url()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ConnectorError::from(e.without_url()))?;
        debug!(
            "{} answered HTTP {} ({} bytes)",
            request.intent,
            status,
            body.len()
        );

        // Error bodies are JSON too, so the status alone decides nothing.
        serde_json::from_slice(&body)
            .map_err(|e| ConnectorError::Decode(format!("{} (HTTP {})", e, status)))
    }
}
