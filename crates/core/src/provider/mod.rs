//! Tracking provider abstraction.
//!
//! A provider turns `(url, tracking number)` into a [`TrackingResult`]. Carrier
//! specific scraping lives behind the [`TrackingProvider`] trait; the
//! [`ProviderRegistry`] resolves a carrier to its implementation and falls
//! back to a generic provider for carriers without one.

mod generic;
mod registry;
mod types;

pub use generic::GenericHttpProvider;
pub use registry::ProviderRegistry;
pub use types::{ProviderError, TrackingEvent, TrackingResult};

use async_trait::async_trait;

/// Capability to check one shipment against a remote source.
///
/// Implementations must not fail for ordinary "cannot determine" outcomes;
/// those are reported as a result with status `Unknown` and
/// `is_delivered = false`. Errors are reserved for infrastructure failures.
#[async_trait]
pub trait TrackingProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Fetch the current tracking state.
    async fn track(
        &self,
        url: &str,
        tracking_number: Option<&str>,
    ) -> Result<TrackingResult, ProviderError>;
}
