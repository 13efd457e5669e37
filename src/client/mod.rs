//! Clients for the two server sources
//!
//! - [`HcloudClient`] talks to the cloud API, the authoritative source that
//!   is queried on every lookup.
//! - [`RobotClient`] talks to the dedicated-server inventory API, which is
//!   only ever polled in bulk by the inventory refresher.
//!
//! Both are reached through the [`PrimarySource`] and [`InventorySource`]
//! traits so that the resolver and refresher can be driven by in-memory
//! fakes in tests.

pub mod hcloud;
pub mod robot;

use async_trait::async_trait;

use crate::models::{NetworkInfo, RobotServer, ServerId, ServerRecord};

pub use hcloud::{HcloudClient, HcloudClientConfig};
pub use robot::{RobotClient, RobotClientConfig};

/// Authoritative, per-lookup server source
#[async_trait]
pub trait PrimarySource: Send + Sync {
    /// Look up a server by name. `Ok(None)` means the server does not exist.
    async fn get_server_by_name(&self, name: &str) -> Result<Option<ServerRecord>, ClientError>;

    /// Look up a server by ID. `Ok(None)` means the server does not exist.
    async fn get_server_by_id(&self, id: ServerId) -> Result<Option<ServerRecord>, ClientError>;

    /// List every server in the project
    async fn list_servers(&self) -> Result<Vec<ServerRecord>, ClientError>;

    /// Look up a private network by numeric ID or by name
    async fn get_network(&self, id_or_name: &str) -> Result<Option<NetworkInfo>, ClientError>;
}

/// Bulk-polled inventory source
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// List every server in the account
    async fn list_all_servers(&self) -> Result<Vec<RobotServer>, ClientError>;
}

// ============================================================================
// Client Errors
// ============================================================================

/// Errors returned by source clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Initialization error
    InitError(String),

    /// Network error
    NetworkError(String),

    /// HTTP error
    HttpError { status: u16, message: String },

    /// Parse error
    ParseError(String),

    /// Error object returned by the API
    ApiError { code: String, message: String },
}

impl ClientError {
    /// Check if the failure is likely transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkError(_) => true,
            Self::HttpError { status, .. } => *status == 429 || *status >= 500,
            Self::ApiError { code, .. } => {
                matches!(code.as_str(), "rate_limit_exceeded" | "unavailable" | "timeout")
            }
            Self::InitError(_) | Self::ParseError(_) => false,
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitError(msg) => write!(f, "Initialization error: {msg}"),
            Self::NetworkError(msg) => write!(f, "Network error: {msg}"),
            Self::HttpError { status, message } => {
                write!(f, "HTTP error ({status}): {message}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::ApiError { code, message } => write!(f, "API error ({code}): {message}"),
        }
    }
}

impl std::error::Error for ClientError {}
