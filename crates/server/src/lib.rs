//! HTTP surface for the shipment tracking engine.

pub mod api;
pub mod metrics;
pub mod state;
