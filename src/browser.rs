//! Client for a headless-browser rendering service.
//!
//! Aggregator redirect pages often navigate with JavaScript, so a plain HTTP
//! fetch sees only the interstitial. When a rendering service is configured,
//! the resolver asks it for the fully-rendered HTML via the service's
//! `/content` endpoint.

use crate::config::BrowserService;
use crate::error::{PipelineError, Result};
use std::time::Duration;

pub struct BrowserClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserClient {
    pub fn new(service: &BrowserService, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: service.base_url.trim_end_matches('/').to_string(),
            token: service.token.clone(),
        })
    }

    /// Fetch fully-rendered HTML content for a URL.
    pub async fn content(&self, url: &str) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
