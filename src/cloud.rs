//! Cloud provider bootstrap and the instance/zone surface
//!
//! [`Cloud`] wires the two source clients, the inventory refresher and the
//! resolver together at startup, and answers the node questions an
//! orchestrator asks: does this instance exist, what are its addresses,
//! which zone is it in.

use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::{
    ClientError, HcloudClient, InventorySource, PrimarySource, RobotClient,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::inventory::{InventoryCache, InventoryRefresher};
use crate::models::{ServerRecord, ServerStatus};
use crate::resolver::{ResolveError, ResolveResult, Resolver};
use crate::{PROVIDER_NAME, PROVIDER_VERSION};

/// Startup options independent of how the sources are built
#[derive(Debug, Clone)]
pub struct CloudOptions {
    /// Name of the node this process runs on
    pub node_name: String,

    /// Private network ID or name to resolve at startup
    pub network: Option<String>,

    /// Inventory polling period
    pub poll_period: Duration,

    /// Whether load balancer support is offered
    pub load_balancers_enabled: bool,
}

impl From<&Config> for CloudOptions {
    fn from(config: &Config) -> Self {
        Self {
            node_name: config.node_name.clone(),
            network: config.hcloud.network.clone(),
            poll_period: config.poll_period(),
            load_balancers_enabled: config.hcloud.load_balancers_enabled,
        }
    }
}

/// Topology of a node as reported to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zone {
    /// Datacenter, e.g. `fsn1-dc8`
    pub failure_domain: String,
    /// Location, e.g. `fsn1`
    pub region: String,
}

impl From<&ServerRecord> for Zone {
    fn from(server: &ServerRecord) -> Self {
        Self {
            failure_domain: server.region.clone(),
            region: server.zone.clone(),
        }
    }
}

/// Address of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "address")]
pub enum NodeAddress {
    Hostname(String),
    ExternalIp(IpAddr),
}

/// Running cloud provider
pub struct Cloud {
    resolver: Resolver,
    inventory_source: Arc<dyn InventorySource>,
    options: CloudOptions,
    network_id: Option<u64>,
    shutdown_tx: watch::Sender<bool>,
    refresher: JoinHandle<()>,
}

impl Cloud {
    /// Build the provider from configuration, talking to the real APIs
    pub async fn new(config: &Config) -> Result<Self> {
        let primary = HcloudClient::new(config.hcloud_client_config())?;
        let inventory = RobotClient::new(config.robot_client_config())?;

        Self::with_sources(Arc::new(primary), Arc::new(inventory), CloudOptions::from(config)).await
    }

    /// Build the provider over arbitrary sources
    pub async fn with_sources(
        primary: Arc<dyn PrimarySource>,
        inventory_source: Arc<dyn InventorySource>,
        options: CloudOptions,
    ) -> Result<Self> {
        let network_id = match &options.network {
            Some(network) => {
                let found = primary
                    .get_network(network)
                    .await
                    .map_err(|e| Error::with_source("failed to look up network", e))?
                    .ok_or_else(|| Error::config(format!("Network {network} not found")))?;
                tracing::info!(network = %found.name, id = found.id, "Using private network");
                Some(found.id)
            }
            None => {
                tracing::info!("{} empty", crate::config::HCLOUD_NETWORK_ENV);
                None
            }
        };

        // Fail fast on bad credentials or an unreachable endpoint
        primary.list_servers().await?;

        let cache = Arc::new(InventoryCache::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let refresher = InventoryRefresher::new(
            Arc::clone(&inventory_source),
            Arc::clone(&cache),
            options.poll_period,
        )
        .spawn(shutdown_rx);

        tracing::info!(
            version = PROVIDER_VERSION,
            node = %options.node_name,
            "Hetzner Cloud k8s cloud controller started"
        );

        Ok(Self {
            resolver: Resolver::new(primary, cache),
            inventory_source,
            options,
            network_id,
            shutdown_tx,
            refresher,
        })
    }

    /// Provider name used in provider IDs
    pub fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Lookup API shared with the orchestrator integration
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Name of the node this process runs on
    pub fn node_name(&self) -> &str {
        &self.options.node_name
    }

    /// ID of the configured private network, if any
    pub fn network_id(&self) -> Option<u64> {
        self.network_id
    }

    pub fn load_balancers_enabled(&self) -> bool {
        self.options.load_balancers_enabled
    }

    /// Poll the inventory right now, outside the regular schedule
    pub async fn refresh_inventory(&self) -> std::result::Result<usize, ClientError> {
        InventoryRefresher::new(
            Arc::clone(&self.inventory_source),
            Arc::clone(self.resolver.inventory()),
            self.options.poll_period,
        )
        .refresh_once()
        .await
    }

    // ------------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------------

    /// Whether the server behind a provider ID still exists.
    ///
    /// Only the not-found sentinel maps to `false`; every other failure
    /// is returned so the caller retries instead of deregistering.
    pub async fn instance_exists_by_provider_id(&self, provider_id: &str) -> ResolveResult<bool> {
        match self.resolver.resolve_by_provider_id(provider_id).await {
            Ok(_) => Ok(true),
            Err(ResolveError::InstanceNotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether the server behind a provider ID is powered off
    pub async fn instance_shutdown_by_provider_id(&self, provider_id: &str) -> ResolveResult<bool> {
        let server = self.resolver.resolve_by_provider_id(provider_id).await?;
        Ok(server.status == ServerStatus::Off)
    }

    /// Machine type of the server behind a provider ID
    pub async fn instance_type_by_provider_id(&self, provider_id: &str) -> ResolveResult<String> {
        let server = self.resolver.resolve_by_provider_id(provider_id).await?;
        Ok(server.machine_type)
    }

    /// Addresses of a node by name
    pub async fn node_addresses(&self, node_name: &str) -> ResolveResult<Vec<NodeAddress>> {
        let server = self.resolver.resolve_by_name(node_name).await?;
        Ok(addresses_of(&server))
    }

    /// Addresses of the server behind a provider ID
    pub async fn node_addresses_by_provider_id(
        &self,
        provider_id: &str,
    ) -> ResolveResult<Vec<NodeAddress>> {
        let server = self.resolver.resolve_by_provider_id(provider_id).await?;
        Ok(addresses_of(&server))
    }

    // ------------------------------------------------------------------------
    // Zones
    // ------------------------------------------------------------------------

    /// Zone of the node this process runs on
    pub async fn current_zone(&self) -> ResolveResult<Zone> {
        self.zone_by_node_name(&self.options.node_name).await
    }

    /// Zone of a node by name
    pub async fn zone_by_node_name(&self, node_name: &str) -> ResolveResult<Zone> {
        let server = self.resolver.resolve_by_name(node_name).await?;
        Ok(Zone::from(&server))
    }

    /// Zone of the server behind a provider ID
    pub async fn zone_by_provider_id(&self, provider_id: &str) -> ResolveResult<Zone> {
        let server = self.resolver.resolve_by_provider_id(provider_id).await?;
        Ok(Zone::from(&server))
    }

    /// Stop the inventory refresher and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.refresher.await {
            tracing::warn!(error = %e, "Inventory refresher ended abnormally");
        }
    }
}

fn addresses_of(server: &ServerRecord) -> Vec<NodeAddress> {
    let mut addresses = vec![NodeAddress::Hostname(server.name.clone())];
    if let Some(ip) = server.address {
        addresses.push(NodeAddress::ExternalIp(ip));
    }
    addresses
}
