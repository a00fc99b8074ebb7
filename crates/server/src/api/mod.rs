pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod scheduler;
pub mod shipments;

pub use routes::create_router;
