//! Common test utilities for driving the router with mock dependencies.
//!
//! The fixture wires a real SQLite store in a temp directory to the mock
//! provider and notifier from `shiptrack_core::testing`, and sends requests
//! through the router in process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use shiptrack_core::{
    testing::{MockNotifier, MockProvider},
    Config, DatabaseConfig, NewShipment, ProviderRegistry, QueueConfig, Scheduler,
    SchedulerConfig, Shipment, ShipmentStore, ShipmentTracker, SqliteShipmentStore,
};
use shiptrack_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use shiptrack_core::testing::fixtures;

/// In-process server with a temp database and controllable mocks.
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<SqliteShipmentStore>,
    pub provider: Arc<MockProvider>,
    pub notifier: Arc<MockNotifier>,
    pub scheduler: Arc<Scheduler>,
    _temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Default::default()
        };

        let store =
            Arc::new(SqliteShipmentStore::new(&db_path).expect("Failed to create store"));
        let provider = Arc::new(MockProvider::named("mock"));
        let notifier = Arc::new(MockNotifier::new());

        let tracker = Arc::new(ShipmentTracker::new(
            Arc::clone(&store) as Arc<dyn ShipmentStore>,
            ProviderRegistry::new(provider.clone()),
            QueueConfig::default(),
            notifier.clone(),
        ));
        let scheduler = Arc::new(Scheduler::new(
            SchedulerConfig::default(),
            Arc::clone(&tracker),
        ));

        let state = Arc::new(AppState::new(config, tracker, Arc::clone(&scheduler)));
        let router = create_router(state);

        Self {
            router,
            store,
            provider,
            notifier,
            scheduler,
            _temp_dir: temp_dir,
        }
    }

    /// Store a UPS shipment awaiting its first check.
    pub fn add_shipment(&self, name: &str) -> Shipment {
        self.store
            .create(NewShipment::new(fixtures::UPS_URL).with_friendly_name(name))
            .expect("Failed to create shipment")
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(json) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request_builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }
}
