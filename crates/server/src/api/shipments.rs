//! Manual check handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use shiptrack_core::{notifier::CheckSummary, CheckOutcome, QueueError, TrackerError};

use crate::state::AppState;

/// Response for a batch check
#[derive(Debug, Serialize)]
pub struct CheckAllResponse {
    pub total: usize,
    pub changed: usize,
    pub delivered: usize,
    pub errors: usize,
    pub outcomes: Vec<CheckOutcome>,
}

#[derive(Debug, Serialize)]
pub struct CheckErrorResponse {
    pub error: String,
}

fn error_status(error: &TrackerError) -> StatusCode {
    match error {
        TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
        TrackerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        TrackerError::Queue(QueueError::TimedOut { .. }) => StatusCode::GATEWAY_TIMEOUT,
        TrackerError::Queue(QueueError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
        TrackerError::Queue(_) => StatusCode::BAD_GATEWAY,
    }
}

type ErrorReply = (StatusCode, Json<CheckErrorResponse>);

fn error_response(error: TrackerError) -> ErrorReply {
    (
        error_status(&error),
        Json(CheckErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Check one shipment now.
pub async fn check_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CheckOutcome>, ErrorReply> {
    state
        .tracker()
        .check_shipment(id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Check every active shipment now and send the summary.
pub async fn check_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckAllResponse>, ErrorReply> {
    let outcomes = state.scheduler().run_now().await.map_err(error_response)?;
    let summary = CheckSummary::from_outcomes(&outcomes);
    Ok(Json(CheckAllResponse {
        total: summary.total,
        changed: summary.changed,
        delivered: summary.delivered,
        errors: summary.errors,
        outcomes,
    }))
}
