use super::{types::Config, ConfigError};

/// Largest accepted poll interval ceiling (minutes).
pub const POLL_INTERVAL_CEILING_MINUTES: u64 = 365 * 24 * 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Queue intervals and timeouts are positive
/// - The backoff cap is not below any base interval
/// - The scheduler's poll interval floor is at least one minute
/// - The poll interval ceiling lies between the floor and one year
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let queue = &config.queue;
    if queue.default_min_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "queue.default_min_interval_secs must be positive".to_string(),
        ));
    }
    if queue.task_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "queue.task_timeout_secs must be positive".to_string(),
        ));
    }
    for (carrier, secs) in &queue.carrier_intervals_secs {
        if *secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "queue.carrier_intervals_secs.{} must be positive",
                carrier
            )));
        }
        if *secs > queue.max_backoff_secs {
            return Err(ConfigError::ValidationError(format!(
                "queue.carrier_intervals_secs.{} exceeds queue.max_backoff_secs",
                carrier
            )));
        }
    }
    if queue.default_min_interval_secs > queue.max_backoff_secs {
        return Err(ConfigError::ValidationError(
            "queue.default_min_interval_secs exceeds queue.max_backoff_secs".to_string(),
        ));
    }

    if config.scheduler.min_poll_interval_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.min_poll_interval_minutes must be at least 1".to_string(),
        ));
    }
    if config.scheduler.max_poll_interval_minutes < config.scheduler.min_poll_interval_minutes {
        return Err(ConfigError::ValidationError(
            "scheduler.max_poll_interval_minutes is below scheduler.min_poll_interval_minutes"
                .to_string(),
        ));
    }
    if config.scheduler.max_poll_interval_minutes > POLL_INTERVAL_CEILING_MINUTES {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.max_poll_interval_minutes must not exceed {} (one year)",
            POLL_INTERVAL_CEILING_MINUTES
        )));
    }

    Ok(())
}
