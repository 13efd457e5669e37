//! Cloud API client
//!
//! Queried synchronously on every lookup. A 404 with the `not_found` error
//! code on a single-object endpoint is reported as `Ok(None)`. Any other
//! 404 (list endpoints, proxies, a wrong base URL) is a failure.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{ClientError, PrimarySource};
use crate::models::{CloudServer, NetworkInfo, ServerId, ServerRecord};

/// Default cloud API endpoint
pub const DEFAULT_HCLOUD_ENDPOINT: &str = "https://api.hetzner.cloud/v1";

const PAGE_SIZE: u32 = 50;

/// Error code the API returns for a missing single object
const NOT_FOUND_CODE: &str = "not_found";

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the cloud API client
#[derive(Clone)]
pub struct HcloudClientConfig {
    /// API endpoint, without trailing slash
    pub endpoint: String,

    /// API token
    pub token: String,

    /// Request timeout
    pub timeout: Duration,

    /// Log every request and response body at debug level
    pub debug: bool,

    /// Application name and version sent as user agent
    pub user_agent: String,
}

impl HcloudClientConfig {
    /// Create a new client config
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_HCLOUD_ENDPOINT.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            debug: false,
            user_agent: format!("hcloud-cloud-controller/{}", crate::PROVIDER_VERSION),
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

    /// Enable request/response debug logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl std::fmt::Debug for HcloudClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HcloudClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ServerResponse {
    server: CloudServer,
}

#[derive(Debug, Deserialize)]
struct ServerListResponse {
    servers: Vec<CloudServer>,
    #[serde(default)]
    meta: Option<ListMeta>,
}

#[derive(Debug, Deserialize)]
struct NetworkResponse {
    network: NetworkInfo,
}

#[derive(Debug, Deserialize)]
struct NetworkListResponse {
    networks: Vec<NetworkInfo>,
}

#[derive(Debug, Deserialize)]
struct ListMeta {
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    next_page: Option<u32>,
}

// ============================================================================
// Cloud Client
// ============================================================================

/// Client for the cloud API
pub struct HcloudClient {
    config: HcloudClientConfig,
    http_client: Client,
}

impl HcloudClient {
    /// Create a new cloud API client
    pub fn new(config: HcloudClientConfig) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    // Internal: send a GET request and read the whole body
    async fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), ClientError> {
        let url = format!("{}{}", self.config.endpoint, path);

        if self.config.debug {
            tracing::debug!(url = %url, query = ?query, "hcloud request");
        }

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.token)
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        if self.config.debug {
            tracing::debug!(url = %url, status = status.as_u16(), body = %body, "hcloud response");
        }

        Ok((status, body))
    }

    // Internal: GET where every non-2xx status is a failure
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let (status, body) = self.request(path, query).await?;

        if !status.is_success() {
            return Err(error_from_response(status, body));
        }

        decode(&body)
    }

    // Internal: GET of a single object. Only a 404 carrying the API's
    // `not_found` code means the object does not exist.
    async fn get_single<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let (status, body) = self.request(path, &[]).await?;

        if status == StatusCode::NOT_FOUND && is_not_found_body(&body) {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(error_from_response(status, body));
        }

        decode(&body).map(Some)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::ParseError(e.to_string()))
}

fn is_not_found_body(body: &str) -> bool {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|api| api.error.code == NOT_FOUND_CODE)
        .unwrap_or(false)
}

fn error_from_response(status: StatusCode, body: String) -> ClientError {
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(api) => ClientError::ApiError {
            code: api.error.code,
            message: api.error.message,
        },
        Err(_) => ClientError::HttpError {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl PrimarySource for HcloudClient {
    async fn get_server_by_name(&self, name: &str) -> Result<Option<ServerRecord>, ClientError> {
        let response: ServerListResponse = self
            .get("/servers", &[("name", name.to_string())])
            .await?;

        Ok(response
            .servers
            .into_iter()
            .next()
            .map(|s| ServerRecord::from_cloud(&s)))
    }

    async fn get_server_by_id(&self, id: ServerId) -> Result<Option<ServerRecord>, ClientError> {
        let response: Option<ServerResponse> = self.get_single(&format!("/servers/{id}")).await?;
        Ok(response.map(|r| ServerRecord::from_cloud(&r.server)))
    }

    async fn list_servers(&self) -> Result<Vec<ServerRecord>, ClientError> {
        let mut servers = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response: ServerListResponse = self
                .get(
                    "/servers",
                    &[("page", page.to_string()), ("per_page", PAGE_SIZE.to_string())],
                )
                .await?;

            servers.extend(response.servers.iter().map(ServerRecord::from_cloud));

            match response.meta.and_then(|m| m.pagination.next_page) {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(servers)
    }

    async fn get_network(&self, id_or_name: &str) -> Result<Option<NetworkInfo>, ClientError> {
        if let Ok(id) = id_or_name.parse::<u64>() {
            let response: Option<NetworkResponse> =
                self.get_single(&format!("/networks/{id}")).await?;
            return Ok(response.map(|r| r.network));
        }

        let response: NetworkListResponse = self
            .get("/networks", &[("name", id_or_name.to_string())])
            .await?;

        Ok(response.networks.into_iter().next())
    }
}
