//! Common test utilities

use async_trait::async_trait;
use hcloud_resolver::client::{ClientError, InventorySource, PrimarySource};
use hcloud_resolver::models::{
    NetworkInfo, NetworkZone, RobotServer, ServerId, ServerRecord, ServerStatus,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory cloud API
#[derive(Default)]
pub struct FakePrimary {
    servers: Mutex<Vec<ServerRecord>>,
    networks: Vec<NetworkInfo>,
    failure: Mutex<Option<ClientError>>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakePrimary {
    pub fn new(servers: Vec<ServerRecord>) -> Self {
        Self {
            servers: Mutex::new(servers),
            ..Default::default()
        }
    }

    pub fn with_network(mut self, network: NetworkInfo) -> Self {
        self.networks.push(network);
        self
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: ClientError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PrimarySource for FakePrimary {
    async fn get_server_by_name(&self, name: &str) -> Result<Option<ServerRecord>, ClientError> {
        self.check()?;
        Ok(self.servers.lock().unwrap().iter().find(|s| s.name == name).cloned())
    }

    async fn get_server_by_id(&self, id: ServerId) -> Result<Option<ServerRecord>, ClientError> {
        self.check()?;
        Ok(self.servers.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn list_servers(&self) -> Result<Vec<ServerRecord>, ClientError> {
        self.check()?;
        Ok(self.servers.lock().unwrap().clone())
    }

    async fn get_network(&self, id_or_name: &str) -> Result<Option<NetworkInfo>, ClientError> {
        self.check()?;
        Ok(self
            .networks
            .iter()
            .find(|n| n.name == id_or_name || n.id.to_string() == id_or_name)
            .cloned())
    }
}

/// In-memory inventory API whose listing can be swapped or broken
#[derive(Default)]
pub struct FakeInventory {
    servers: Mutex<Vec<RobotServer>>,
    failure: Mutex<Option<ClientError>>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeInventory {
    pub fn new(servers: Vec<RobotServer>) -> Self {
        Self {
            servers: Mutex::new(servers),
            ..Default::default()
        }
    }

    pub fn set_servers(&self, servers: Vec<RobotServer>) {
        *self.servers.lock().unwrap() = servers;
    }

    pub fn fail_with(&self, error: ClientError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventorySource for FakeInventory {
    async fn list_all_servers(&self) -> Result<Vec<RobotServer>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.failure.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.servers.lock().unwrap().clone())
    }
}

/// Create a cloud server record with default values
#[allow(dead_code)]
pub fn cloud_server(id: ServerId, name: &str) -> ServerRecord {
    ServerRecord {
        id,
        name: name.to_string(),
        machine_type: "cx21".to_string(),
        zone: "nbg1".to_string(),
        region: "nbg1-dc3".to_string(),
        network_zone: Some(NetworkZone::EuCentral),
        address: Some("203.0.113.10".parse().unwrap()),
        status: ServerStatus::Running,
    }
}

/// Create an inventory listing entry with default values
#[allow(dead_code)]
pub fn robot_server(id: ServerId, name: &str) -> RobotServer {
    RobotServer {
        server_number: id,
        server_name: name.to_string(),
        server_ip: Some("198.51.100.7".to_string()),
        product: "AX41-NVMe".to_string(),
        dc: "FSN1-DC8".to_string(),
    }
}
