use std::sync::Arc;

use shiptrack_core::{Config, SanitizedConfig, Scheduler, ShipmentTracker};

/// Shared application state
pub struct AppState {
    config: Config,
    tracker: Arc<ShipmentTracker>,
    scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(config: Config, tracker: Arc<ShipmentTracker>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            config,
            tracker,
            scheduler,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn tracker(&self) -> &ShipmentTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
