//! Prometheus metrics for inventory refresh and server lookups
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.
//! [`serve_metrics`] exposes the registry over HTTP.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Encoder, Gauge,
    TextEncoder,
};
use std::sync::OnceLock;

mod server;

pub use server::{metrics_router, serve_metrics};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for inventory refresher metrics
struct InventoryMetrics {
    refresh_success: Counter,
    refresh_failure: Counter,
    servers: Gauge,
    last_success_timestamp: Gauge,
}

/// Container for resolver metrics
struct ResolverMetrics {
    lookups: CounterVec,
}

static INVENTORY_METRICS: OnceLock<InventoryMetrics> = OnceLock::new();

static RESOLVER_METRICS: OnceLock<ResolverMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// Calling it again is a no-op.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let inventory = InventoryMetrics {
        refresh_success: register_counter!(
            "hcloud_inventory_refresh_success_total",
            "Total successful inventory polls"
        )?,
        refresh_failure: register_counter!(
            "hcloud_inventory_refresh_failure_total",
            "Total failed inventory polls"
        )?,
        servers: register_gauge!(
            "hcloud_inventory_servers",
            "Number of servers in the current inventory snapshot"
        )?,
        last_success_timestamp: register_gauge!(
            "hcloud_inventory_last_success_timestamp_seconds",
            "Unix time of the last successful inventory poll"
        )?,
    };

    let resolver = ResolverMetrics {
        lookups: register_counter_vec!(
            "hcloud_resolver_lookups_total",
            "Server lookups by key kind and outcome",
            &["kind", "outcome"]
        )?,
    };

    INVENTORY_METRICS.set(inventory).map_err(|_| "Inventory metrics already initialized")?;
    RESOLVER_METRICS.set(resolver).map_err(|_| "Resolver metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    INVENTORY_METRICS.get().is_some() && RESOLVER_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a successful inventory poll
pub fn record_refresh_success(servers: usize) {
    let Some(m) = INVENTORY_METRICS.get() else {
        return;
    };

    m.refresh_success.inc();
    m.servers.set(servers as f64);
    m.last_success_timestamp
        .set(chrono::Utc::now().timestamp() as f64);
}

/// Record a failed inventory poll
pub fn record_refresh_failure() {
    if let Some(m) = INVENTORY_METRICS.get() {
        m.refresh_failure.inc();
    }
}

/// Record a lookup outcome (`cloud`, `inventory`, `not_found`, `error`)
pub fn record_lookup(kind: &str, outcome: &str) {
    if let Some(m) = RESOLVER_METRICS.get() {
        m.lookups.with_label_values(&[kind, outcome]).inc();
    }
}
