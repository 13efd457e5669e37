//! End-to-end integration tests
//!
//! - Startup from configuration against mock APIs
//! - Fallback from the cloud API to the inventory
//! - Inventory outages after startup

pub mod end_to_end;
pub mod fixtures;
