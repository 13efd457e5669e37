//! Server resolution across the cloud API and the inventory
//!
//! Every lookup asks the cloud API first. Only a definitive "no such
//! server" falls through to the inventory snapshot; a failed cloud call is
//! returned to the caller as is and the inventory is not consulted.
//!
//! ```text
//!  resolve_by_name / resolve_by_id
//!              │
//!              ▼
//!      ┌───────────────┐  Failed(e)   ┌──────────────────────┐
//!      │   cloud API   │─────────────▶│ Err(Transport(e))    │
//!      └───────────────┘              └──────────────────────┘
//!        │Found     │Absent
//!        ▼          ▼
//!     Ok(record)  ┌───────────────┐   miss   ┌──────────────────────┐
//!                 │ inventory     │─────────▶│ Err(InstanceNotFound)│
//!                 │ snapshot      │          └──────────────────────┘
//!                 └───────────────┘
//!                        │hit
//!                        ▼
//!                    Ok(record)
//! ```

pub mod error;
pub mod provider_id;

use std::fmt;
use std::sync::Arc;

use crate::client::{ClientError, PrimarySource};
use crate::inventory::InventoryCache;
use crate::metrics;
use crate::models::{ServerId, ServerRecord};

pub use error::{MalformedReason, ResolveError, ResolveResult};
pub use provider_id::{parse_provider_id, provider_id_for, PROVIDER_PREFIX};

/// Outcome of querying one source
#[derive(Debug)]
pub enum Lookup {
    Found(ServerRecord),
    Absent,
    Failed(ClientError),
}

impl From<Result<Option<ServerRecord>, ClientError>> for Lookup {
    fn from(result: Result<Option<ServerRecord>, ClientError>) -> Self {
        match result {
            Ok(Some(server)) => Self::Found(server),
            Ok(None) => Self::Absent,
            Err(e) => Self::Failed(e),
        }
    }
}

impl From<Option<ServerRecord>> for Lookup {
    fn from(server: Option<ServerRecord>) -> Self {
        server.map_or(Self::Absent, Self::Found)
    }
}

#[derive(Debug, Clone, Copy)]
enum LookupKey<'a> {
    Name(&'a str),
    Id(ServerId),
}

impl LookupKey<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Id(_) => "id",
        }
    }
}

impl fmt::Display for LookupKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "serverName: {name}"),
            Self::Id(id) => write!(f, "serverID: {id}"),
        }
    }
}

/// One logical server directory over the cloud API and the inventory
#[derive(Clone)]
pub struct Resolver {
    primary: Arc<dyn PrimarySource>,
    inventory: Arc<InventoryCache>,
}

impl Resolver {
    /// Create a resolver over a cloud source and an inventory snapshot
    pub fn new(primary: Arc<dyn PrimarySource>, inventory: Arc<InventoryCache>) -> Self {
        Self { primary, inventory }
    }

    /// Inventory snapshot the resolver falls back to
    pub fn inventory(&self) -> &Arc<InventoryCache> {
        &self.inventory
    }

    /// Resolve a server by name
    pub async fn resolve_by_name(&self, name: &str) -> ResolveResult<ServerRecord> {
        let key = LookupKey::Name(name);
        let primary = self.primary.get_server_by_name(name).await.into();
        self.settle(key, primary).await
    }

    /// Resolve a server by ID
    pub async fn resolve_by_id(&self, id: ServerId) -> ResolveResult<ServerRecord> {
        let key = LookupKey::Id(id);
        let primary = self.primary.get_server_by_id(id).await.into();
        self.settle(key, primary).await
    }

    /// Resolve the server behind a provider ID
    pub async fn resolve_by_provider_id(&self, provider_id: &str) -> ResolveResult<ServerRecord> {
        let id = parse_provider_id(provider_id)?;
        self.resolve_by_id(id).await
    }

    async fn settle(&self, key: LookupKey<'_>, primary: Lookup) -> ResolveResult<ServerRecord> {
        match primary {
            Lookup::Found(server) => {
                metrics::record_lookup(key.kind(), "cloud");
                Ok(server)
            }
            Lookup::Failed(e) => {
                tracing::debug!(key = %key, error = %e, "Cloud lookup failed");
                metrics::record_lookup(key.kind(), "error");
                Err(ResolveError::Transport(e))
            }
            Lookup::Absent => match self.lookup_inventory(key).await {
                Lookup::Found(server) => {
                    tracing::debug!(key = %key, "Resolved from inventory");
                    metrics::record_lookup(key.kind(), "inventory");
                    Ok(server)
                }
                _ => {
                    tracing::warn!(key = %key, "Not found in cloud and inventory");
                    metrics::record_lookup(key.kind(), "not_found");
                    Err(ResolveError::InstanceNotFound)
                }
            },
        }
    }

    async fn lookup_inventory(&self, key: LookupKey<'_>) -> Lookup {
        match key {
            LookupKey::Name(name) => self.inventory.find_by_name(name).await.into(),
            LookupKey::Id(id) => self.inventory.find_by_id(id).await.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkInfo, NetworkZone, RobotServer, ServerStatus};
    use async_trait::async_trait;

    /// Cloud source with a fixed answer for every call
    struct FixedPrimary(Result<Option<ServerRecord>, ClientError>);

    #[async_trait]
    impl PrimarySource for FixedPrimary {
        async fn get_server_by_name(&self, _: &str) -> Result<Option<ServerRecord>, ClientError> {
            self.0.clone()
        }

        async fn get_server_by_id(&self, _: ServerId) -> Result<Option<ServerRecord>, ClientError> {
            self.0.clone()
        }

        async fn list_servers(&self) -> Result<Vec<ServerRecord>, ClientError> {
            Ok(self.0.clone()?.into_iter().collect())
        }

        async fn get_network(&self, _: &str) -> Result<Option<NetworkInfo>, ClientError> {
            Ok(None)
        }
    }

    fn cloud_record(id: ServerId, name: &str) -> ServerRecord {
        ServerRecord {
            id,
            name: name.to_string(),
            machine_type: "cx21".to_string(),
            zone: "nbg1".to_string(),
            region: "nbg1-dc3".to_string(),
            network_zone: Some(NetworkZone::EuCentral),
            address: None,
            status: ServerStatus::Running,
        }
    }

    async fn inventory_with(names: &[(ServerId, &str)]) -> Arc<InventoryCache> {
        let cache = Arc::new(InventoryCache::new());
        let records = names
            .iter()
            .map(|(id, name)| {
                ServerRecord::from_robot(&RobotServer {
                    server_number: *id,
                    server_name: name.to_string(),
                    server_ip: None,
                    product: "EX41".to_string(),
                    dc: "FSN1-DC8".to_string(),
                })
            })
            .collect();
        cache.replace(records).await;
        cache
    }

    #[tokio::test]
    async fn test_cloud_hit_wins() {
        let inventory = inventory_with(&[(1, "node")]).await;
        let resolver = Resolver::new(
            Arc::new(FixedPrimary(Ok(Some(cloud_record(1, "node"))))),
            inventory.clone(),
        );

        let server = resolver.resolve_by_name("node").await.unwrap();
        assert_eq!(server.machine_type, "cx21");
        assert_eq!(inventory.stats().reads, 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_inventory() {
        let resolver = Resolver::new(
            Arc::new(FixedPrimary(Ok(None))),
            inventory_with(&[(321, "dedicated")]).await,
        );

        let by_name = resolver.resolve_by_name("dedicated").await.unwrap();
        assert_eq!(by_name.id, 321);
        assert_eq!(by_name.network_zone, Some(NetworkZone::EuCentral));

        let by_id = resolver.resolve_by_id(321).await.unwrap();
        assert_eq!(by_id.name, "dedicated");
    }

    #[tokio::test]
    async fn test_not_found_sentinel() {
        let resolver = Resolver::new(Arc::new(FixedPrimary(Ok(None))), inventory_with(&[]).await);

        let first = resolver.resolve_by_name("ghost").await.unwrap_err();
        let second = resolver.resolve_by_id(404).await.unwrap_err();

        assert_eq!(first, ResolveError::InstanceNotFound);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_transport_error_skips_inventory() {
        let inventory = inventory_with(&[(1, "node")]).await;
        let reads_before = inventory.stats().reads;
        let failure = ClientError::NetworkError("timeout".to_string());
        let resolver = Resolver::new(
            Arc::new(FixedPrimary(Err(failure.clone()))),
            inventory.clone(),
        );

        let err = resolver.resolve_by_name("node").await.unwrap_err();

        assert_eq!(err, ResolveError::Transport(failure));
        assert_eq!(inventory.stats().reads, reads_before);
    }

    #[tokio::test]
    async fn test_resolve_by_provider_id() {
        let resolver = Resolver::new(
            Arc::new(FixedPrimary(Ok(None))),
            inventory_with(&[(77, "dedicated")]).await,
        );

        assert_eq!(resolver.resolve_by_provider_id("hcloud://77").await.unwrap().name, "dedicated");
        assert!(matches!(
            resolver.resolve_by_provider_id("hcloud://x").await,
            Err(ResolveError::MalformedIdentifier { .. })
        ));
    }
}
