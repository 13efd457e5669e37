//! Snapshot cache for the dedicated-server inventory

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{ServerId, ServerRecord};

/// Last complete inventory listing.
///
/// The snapshot is an immutable `Arc<[ServerRecord]>`. `read` hands out a
/// clone of the pointer and `replace` swaps it, so a reader holds either
/// the old or the new listing in full and never sees one being built.
pub struct InventoryCache {
    snapshot: RwLock<Arc<[ServerRecord]>>,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
    reads: AtomicU64,
    replaces: AtomicU64,
}

impl InventoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::from(Vec::new())),
            last_refresh: RwLock::new(None),
            reads: AtomicU64::new(0),
            replaces: AtomicU64::new(0),
        }
    }

    /// Latest committed snapshot
    pub async fn read(&self) -> Arc<[ServerRecord]> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Swap in a new snapshot
    pub async fn replace(&self, servers: Vec<ServerRecord>) {
        let snapshot: Arc<[ServerRecord]> = Arc::from(servers);
        *self.snapshot.write().await = snapshot;
        *self.last_refresh.write().await = Some(Utc::now());
        self.replaces.fetch_add(1, Ordering::Relaxed);
    }

    /// First record with the given name, in snapshot order
    pub async fn find_by_name(&self, name: &str) -> Option<ServerRecord> {
        self.read().await.iter().find(|s| s.name == name).cloned()
    }

    /// First record with the given ID, in snapshot order
    pub async fn find_by_id(&self, id: ServerId) -> Option<ServerRecord> {
        self.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Number of records in the current snapshot
    pub async fn len(&self) -> usize {
        self.snapshot.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// When the snapshot was last replaced
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.read().await
    }

    /// Read/replace counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            reads: self.reads.load(Ordering::Relaxed),
            replaces: self.replaces.load(Ordering::Relaxed),
        }
    }
}

impl Default for InventoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache access counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Snapshot reads, including lookups
    pub reads: u64,
    /// Snapshot replacements
    pub replaces: u64,
}
