// Core data structures for server resolution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Numeric server identifier, unique within the source that produced it
pub type ServerId = u64;

/// Network zone every inventory server is placed in.
///
/// The inventory API does not report a network zone, and the dedicated
/// servers this crate resolves only operate in the central European
/// locations, so inventory records always carry this value.
pub const INVENTORY_NETWORK_ZONE: NetworkZone = NetworkZone::EuCentral;

/// Network zone of a datacenter location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkZone {
    EuCentral,
    UsEast,
    UsWest,
    ApSoutheast,
    #[serde(untagged)]
    Other(String),
}

impl NetworkZone {
    /// Get string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::EuCentral => "eu-central",
            Self::UsEast => "us-east",
            Self::UsWest => "us-west",
            Self::ApSoutheast => "ap-southeast",
            Self::Other(zone) => zone,
        }
    }
}

impl fmt::Display for NetworkZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power state of a server as reported by the cloud API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Running,
    Initializing,
    Starting,
    Stopping,
    Off,
    Deleting,
    Migrating,
    Rebuilding,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ServerStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Initializing => "initializing",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Off => "off",
            Self::Deleting => "deleting",
            Self::Migrating => "migrating",
            Self::Rebuilding => "rebuilding",
            Self::Unknown => "unknown",
        }
    }
}

/// A compute node, independent of the source that reported it.
///
/// Records are built fresh for every lookup or refresh and are never
/// mutated after construction; callers own what they receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: ServerId,
    pub name: String,
    pub machine_type: String,
    /// Lower-cased short location code (e.g. `fsn1`)
    pub zone: String,
    /// Lower-cased datacenter code (e.g. `fsn1-dc8`)
    pub region: String,
    pub network_zone: Option<NetworkZone>,
    pub address: Option<IpAddr>,
    pub status: ServerStatus,
}

impl ServerRecord {
    /// Build a record from an inventory (dedicated server) listing entry
    pub fn from_robot(server: &RobotServer) -> Self {
        let region = server.dc.to_lowercase();
        let zone = region.split('-').next().unwrap_or_default().to_string();

        Self {
            id: server.server_number,
            name: server.server_name.clone(),
            machine_type: server.product.clone(),
            zone,
            region,
            network_zone: Some(INVENTORY_NETWORK_ZONE),
            address: server.server_ip.as_deref().and_then(|ip| ip.parse().ok()),
            status: ServerStatus::Running,
        }
    }

    /// Build a record from a cloud API server object
    pub fn from_cloud(server: &CloudServer) -> Self {
        let (zone, region, network_zone) = match &server.datacenter {
            Some(dc) => (
                dc.location.name.to_lowercase(),
                dc.name.to_lowercase(),
                dc.location.network_zone.clone(),
            ),
            None => (String::new(), String::new(), None),
        };

        Self {
            id: server.id,
            name: server.name.clone(),
            machine_type: server
                .server_type
                .as_ref()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            zone,
            region,
            network_zone,
            address: server
                .public_net
                .ipv4
                .as_ref()
                .and_then(|v4| v4.ip.parse().ok()),
            status: server.status,
        }
    }
}

// ============================================================================
// Native records: inventory API
// ============================================================================

/// Dedicated server as listed by the inventory API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotServer {
    pub server_number: ServerId,
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub server_ip: Option<String>,
    #[serde(default)]
    pub product: String,
    /// Datacenter code, e.g. `FSN1-DC8`
    #[serde(default)]
    pub dc: String,
}

// ============================================================================
// Native records: cloud API
// ============================================================================

/// Server object returned by the cloud API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudServer {
    pub id: ServerId,
    pub name: String,
    #[serde(default)]
    pub status: ServerStatus,
    #[serde(default)]
    pub public_net: CloudPublicNet,
    pub server_type: Option<CloudServerType>,
    pub datacenter: Option<CloudDatacenter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudPublicNet {
    pub ipv4: Option<CloudIpv4>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudIpv4 {
    pub ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudServerType {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudDatacenter {
    pub name: String,
    pub location: CloudLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudLocation {
    pub name: String,
    pub network_zone: Option<NetworkZone>,
}

/// Private network known to the cloud API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub ip_range: String,
}
