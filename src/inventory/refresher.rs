//! Background poller that keeps the inventory cache fresh

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::cache::InventoryCache;
use crate::client::{ClientError, InventorySource};
use crate::metrics;
use crate::models::ServerRecord;

/// Polls the inventory source and replaces the cache on every cycle.
///
/// A failed poll leaves the previous snapshot in place and is only
/// logged; the loop keeps going at the same period.
pub struct InventoryRefresher {
    source: Arc<dyn InventorySource>,
    cache: Arc<InventoryCache>,
    period: Duration,
}

impl InventoryRefresher {
    /// Create a new refresher
    pub fn new(
        source: Arc<dyn InventorySource>,
        cache: Arc<InventoryCache>,
        period: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            period,
        }
    }

    /// Polling period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one poll and commit the result.
    ///
    /// Returns the number of records now visible in the cache.
    pub async fn refresh_once(&self) -> Result<usize, ClientError> {
        let servers = self.source.list_all_servers().await?;

        let records: Vec<ServerRecord> = servers.iter().map(ServerRecord::from_robot).collect();
        let count = records.len();

        self.cache.replace(records).await;
        Ok(count)
    }

    /// Start the polling loop.
    ///
    /// The first poll runs immediately. The loop ends only when `shutdown`
    /// flips to `true` or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(period_secs = self.period.as_secs(), "Inventory refresher started");

            loop {
                match self.refresh_once().await {
                    Ok(count) => {
                        tracing::debug!(servers = count, "Inventory refreshed");
                        metrics::record_refresh_success(count);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to get servers from inventory");
                        metrics::record_refresh_failure();
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.period) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Inventory refresher stopped");
        })
    }
}
