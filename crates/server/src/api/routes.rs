use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, notifications, scheduler, shipments};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Queue
        .route("/queue/status", get(handlers::queue_status))
        // Scheduler
        .route("/scheduler/status", get(scheduler::get_status))
        .route("/scheduler/restart", post(scheduler::restart))
        .route("/scheduler/interval", put(scheduler::set_interval))
        // Checks
        .route("/shipments/check", post(shipments::check_all))
        .route("/shipments/{id}/check", post(shipments::check_one))
        // Notifications
        .route("/notifications/{channel}/test", post(notifications::send_test))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
