//! Notification handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use shiptrack_core::{NotifyChannel, NotifyError};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<NotificationErrorResponse>);

fn error_response(status: StatusCode, error: String) -> ErrorReply {
    (status, Json(NotificationErrorResponse { error }))
}

/// Send a test message on one channel (`email` or `discord`).
pub async fn send_test(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Result<Json<MessageResponse>, ErrorReply> {
    let channel: NotifyChannel = channel
        .parse()
        .map_err(|e: String| error_response(StatusCode::NOT_FOUND, e))?;

    match state.tracker().notifier().send_test_message(channel).await {
        Ok(()) => Ok(Json(MessageResponse {
            message: format!("Test {} notification sent", channel),
        })),
        Err(e) => {
            let status = match e {
                NotifyError::Configuration(_) | NotifyError::Unsupported(_) => {
                    StatusCode::BAD_REQUEST
                }
                NotifyError::Http(_) => StatusCode::BAD_GATEWAY,
            };
            Err(error_response(status, e.to_string()))
        }
    }
}
