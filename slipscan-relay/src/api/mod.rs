//! HTTP API handlers for slipscan-relay

pub mod export;
pub mod extract;
pub mod forms;
pub mod health;

pub use export::export_results;
pub use extract::{extract_multi, extract_single};
pub use health::health_routes;
