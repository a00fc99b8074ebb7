//! Mock tracking provider for testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::carrier::Carrier;
use crate::provider::{ProviderError, TrackingProvider, TrackingResult};

/// A recorded `track` call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTrack {
    pub url: String,
    pub tracking_number: Option<String>,
}

/// Mock implementation of the TrackingProvider trait.
///
/// Provides controllable behavior for testing:
/// - Return queued results or errors in order
/// - Fall back to an `Unknown` result when nothing is queued
/// - Track calls for assertions
/// - Simulate delays and calls that never settle
pub struct MockProvider {
    name: String,
    /// Responses returned in order.
    responses: Arc<RwLock<VecDeque<Result<TrackingResult, ProviderError>>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedTrack>>>,
    /// Delay applied before answering.
    delay: Arc<RwLock<Option<Duration>>>,
    /// If true, calls never settle.
    hang: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("responses", &"<responses>")
            .field("calls", &"<calls>")
            .finish()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::named("mock")
    }

    /// Create a mock that reports `name` as its provider name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Arc::new(RwLock::new(VecDeque::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
            hang: Arc::new(RwLock::new(false)),
        }
    }

    /// Create a mock with predefined results.
    pub fn with_results(results: Vec<TrackingResult>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(results.into_iter().map(Ok).collect())),
            ..Self::new()
        }
    }

    /// Queue a successful result.
    pub async fn push_result(&self, result: TrackingResult) {
        self.responses.write().await.push_back(Ok(result));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: ProviderError) {
        self.responses.write().await.push_back(Err(error));
    }

    /// Delay every answer by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Make every call hang forever.
    pub async fn set_hang(&self, hang: bool) {
        *self.hang.write().await = hang;
    }

    /// Get recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedTrack> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl TrackingProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn track(
        &self,
        url: &str,
        tracking_number: Option<&str>,
    ) -> Result<TrackingResult, ProviderError> {
        self.calls.write().await.push(RecordedTrack {
            url: url.to_string(),
            tracking_number: tracking_number.map(String::from),
        });

        if *self.hang.read().await {
            futures::future::pending::<()>().await;
        }
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(TrackingResult::unknown(Carrier::Unknown)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_returns_queued_responses_in_order() {
        let provider = MockProvider::named("ups");
        provider
            .push_result(fixtures::tracking_result("In Transit", false))
            .await;
        provider
            .push_error(ProviderError::Network("reset".to_string()))
            .await;

        let first = provider.track("u", Some("n")).await.unwrap();
        assert_eq!(first.status, "In Transit");
        assert!(provider.track("u", None).await.is_err());

        let fallback = provider.track("u", None).await.unwrap();
        assert_eq!(fallback.status, "Unknown");
        assert!(!fallback.is_delivered);

        let calls = provider.recorded_calls().await;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].tracking_number.as_deref(), Some("n"));
    }

    #[tokio::test]
    async fn test_with_results() {
        let provider = MockProvider::with_results(vec![fixtures::tracking_result("Delivered", true)]);
        assert!(provider.track("u", None).await.unwrap().is_delivered);
    }
}
