//! reqwest client for the Waldur REST API.
//!
//! Counts come from the `X-Result-Count` header of a `HEAD` on a list
//! endpoint, breakdowns from `GET marketplace-stats/<action>/`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use super::base::StatsSource;
use crate::error::ClientError;

const RESULT_COUNT_HEADER: &str = "x-result-count";

/// Talks to a Waldur deployment with a static API token.
pub struct WaldurClient {
    api_url: String,
    token: String,
    http: reqwest::Client,
}

impl WaldurClient {
    /// Builds a client for `api_url`, accepting both `https://host` and
    /// `https://host/api/`.
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, ClientError> {
        let api_url = normalize_api_url(api_url);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                url: api_url.clone(),
                message: e.to_string(),
            })?;
        info!("Creating Waldur client for '{}'", api_url);
        Ok(Self {
            api_url,
            token: token.to_string(),
            http,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}/", self.api_url, path.trim_matches('/'))
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }

    async fn check_status(url: &str, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl StatsSource for WaldurClient {
    async fn count(&self, endpoint: &str, query: &[(String, String)]) -> Result<u64, ClientError> {
        let url = self.url_for(endpoint);
        debug!("Sending HEAD request to {} with {} filter(s)", url, query.len());

        let mut request = self
            .http
            .head(&url)
            .header("Authorization", self.authorization());
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await.map_err(|e| ClientError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let response = Self::check_status(&url, response).await?;

        response
            .headers()
            .get(RESULT_COUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or(ClientError::MissingCount { url })
    }

    async fn stats(&self, action: &str) -> Result<Value, ClientError> {
        let url = self.url_for(&format!("marketplace-stats/{}", action));
        debug!("Sending GET request to {}", url);

        let response = self
            .http
            .get(&url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let response = Self::check_status(&url, response).await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Decode {
                url,
                message: e.to_string(),
            })
    }
}

/// Strips trailing slashes and makes sure the URL ends in `/api`.
fn normalize_api_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    }
}
