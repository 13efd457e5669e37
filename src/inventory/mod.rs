//! Dedicated-server inventory
//!
//! The inventory API is slow and rate limited, so it is never queried per
//! lookup. Instead an [`InventoryRefresher`] polls it on a fixed period and
//! swaps the full listing into an [`InventoryCache`], which the resolver
//! reads as a fallback.
//!
//! ```text
//! InventoryRefresher ──replace──▶ InventoryCache ◀──read── Resolver
//! ```

pub mod cache;
pub mod refresher;

pub use cache::{CacheStats, InventoryCache};
pub use refresher::InventoryRefresher;
