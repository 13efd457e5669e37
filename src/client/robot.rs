//! Dedicated-server inventory API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{ClientError, InventorySource};
use crate::models::RobotServer;

/// Default inventory API endpoint
pub const DEFAULT_ROBOT_ENDPOINT: &str = "https://robot-ws.your-server.de";

/// Configuration for the inventory API client
#[derive(Clone)]
pub struct RobotClientConfig {
    /// API endpoint, without trailing slash
    pub endpoint: String,

    /// Web service user
    pub user: String,

    /// Web service password
    pub password: String,

    /// Request timeout
    pub timeout: Duration,
}

impl RobotClientConfig {
    /// Create a new client config
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ROBOT_ENDPOINT.to_string(),
            user: user.into(),
            password: password.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for RobotClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotClientConfig")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ServerEnvelope {
    server: RobotServer,
}

#[derive(Debug, Deserialize)]
struct RobotErrorBody {
    error: RobotErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RobotErrorDetail {
    code: String,
    message: String,
}

/// Client for the dedicated-server inventory API
pub struct RobotClient {
    config: RobotClientConfig,
    http_client: Client,
}

impl RobotClient {
    /// Create a new inventory API client
    pub fn new(config: RobotClientConfig) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl InventorySource for RobotClient {
    async fn list_all_servers(&self) -> Result<Vec<RobotServer>, ClientError> {
        let url = format!("{}/server", self.config.endpoint);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return match serde_json::from_str::<RobotErrorBody>(&body) {
                // An account without dedicated servers answers with 404
                Ok(err) if err.error.code == "SERVER_NOT_FOUND" => Ok(Vec::new()),
                Ok(err) => Err(ClientError::ApiError {
                    code: err.error.code,
                    message: err.error.message,
                }),
                Err(_) => Err(ClientError::HttpError {
                    status: status.as_u16(),
                    message: body,
                }),
            };
        }

        let envelopes: Vec<ServerEnvelope> =
            serde_json::from_str(&body).map_err(|e| ClientError::ParseError(e.to_string()))?;

        Ok(envelopes.into_iter().map(|e| e.server).collect())
    }
}
