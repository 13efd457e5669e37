//! hcloud-resolver - node identity for Hetzner Cloud and dedicated servers
//!
//! Resolves cluster nodes to server records using two sources: the cloud
//! API, queried on every lookup, and the dedicated-server inventory, polled
//! in the background and cached.
//!
//! # Architecture
//!
//! - [`models`] - Unified server record and the native API records
//! - [`client`] - Cloud API and inventory API clients
//! - [`inventory`] - Inventory snapshot cache and its background refresher
//! - [`resolver`] - Lookup by name, ID and provider ID with fallback
//! - [`cloud`] - Startup wiring and the instance/zone surface
//! - [`config`] - Configuration from environment or TOML
//! - [`metrics`] - Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use hcloud_resolver::cloud::Cloud;
//! use hcloud_resolver::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let cloud = Cloud::new(&config).await?;
//!     let server = cloud.resolver().resolve_by_name("worker-1").await?;
//!     println!("{}", server.id);
//!     cloud.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod cloud;
pub mod config;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod resolver;

/// Provider name, also the provider ID scheme
pub const PROVIDER_NAME: &str = "hcloud";

/// Version reported to the cloud API
pub const PROVIDER_VERSION: &str = "v1.8.0";

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cloud::{Cloud, CloudOptions, NodeAddress, Zone};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::inventory::{InventoryCache, InventoryRefresher};
    pub use crate::models::{NetworkZone, ServerId, ServerRecord, ServerStatus};
    pub use crate::resolver::{parse_provider_id, ResolveError, Resolver};
}

pub use models::{ServerId, ServerRecord};
pub use resolver::{parse_provider_id, ResolveError, Resolver};
