//! Scheduler API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use shiptrack_core::SchedulerStatus;
use tracing::error;

use crate::state::AppState;

/// Request body for changing the poll interval
#[derive(Debug, Deserialize)]
pub struct SetIntervalBody {
    pub minutes: u64,
}

/// Response for a poll interval change
#[derive(Debug, Serialize)]
pub struct SetIntervalResponse {
    /// Interval actually saved, after clamping
    pub interval_minutes: u64,
    pub status: SchedulerStatus,
}

#[derive(Debug, Serialize)]
pub struct SchedulerErrorResponse {
    pub error: String,
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler().status().await)
}

/// Restart the scheduler, picking up the saved poll interval.
pub async fn restart(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    state.scheduler().restart().await;
    Json(state.scheduler().status().await)
}

pub async fn set_interval(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetIntervalBody>,
) -> Result<Json<SetIntervalResponse>, impl IntoResponse> {
    match state.scheduler().set_poll_interval(body.minutes).await {
        Ok(interval_minutes) => Ok(Json(SetIntervalResponse {
            interval_minutes,
            status: state.scheduler().status().await,
        })),
        Err(e) => {
            error!("Failed to save poll interval: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SchedulerErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
