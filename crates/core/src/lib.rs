//! Shipment tracking engine.
//!
//! Resolves carriers from tracking URLs, paces outbound checks per carrier,
//! reconciles results into stored shipments and history, and runs checks on
//! a schedule.

pub mod carrier;
pub mod config;
pub mod metrics;
pub mod notifier;
pub mod provider;
pub mod queue;
pub mod scheduler;
pub mod shipment;
pub mod testing;
pub mod tracker;

pub use carrier::{
    detect_carrier, extract_tracking_number, normalize_status, Carrier, StatusCategory,
    PENDING_FIRST_CHECK, UNKNOWN_STATUS,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    NotificationsConfig, ProviderConfig, SanitizedConfig, ServerConfig,
};
pub use notifier::{
    ChannelNotifier, DiscordNotifier, EmailNotifier, LogNotifier, Notifier, NotifyChannel,
    NotifyError,
};
pub use provider::{
    GenericHttpProvider, ProviderError, ProviderRegistry, TrackingEvent, TrackingProvider,
    TrackingResult,
};
pub use queue::{QueueConfig, QueueError, QueueStatus, RateLimitedQueue};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStatus};
pub use shipment::{
    NewHistoryEvent, NewShipment, Shipment, ShipmentStore, ShipmentUpdate, SqliteShipmentStore,
    StatusHistoryEvent, StoreError,
};
pub use tracker::{CheckOutcome, CheckResultSummary, ShipmentTracker, SkipReason, TrackerError};
