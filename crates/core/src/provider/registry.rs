//! Carrier to provider resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::carrier::Carrier;

use super::TrackingProvider;

/// Maps carriers to provider implementations.
///
/// Carriers without a registered provider resolve to the fallback.
pub struct ProviderRegistry {
    providers: HashMap<Carrier, Arc<dyn TrackingProvider>>,
    fallback: Arc<dyn TrackingProvider>,
}

impl ProviderRegistry {
    /// Create a registry that routes everything to `fallback`.
    pub fn new(fallback: Arc<dyn TrackingProvider>) -> Self {
        Self {
            providers: HashMap::new(),
            fallback,
        }
    }

    /// Register a provider for a carrier, replacing any previous one.
    pub fn with_provider(mut self, carrier: Carrier, provider: Arc<dyn TrackingProvider>) -> Self {
        self.register(carrier, provider);
        self
    }

    pub fn register(&mut self, carrier: Carrier, provider: Arc<dyn TrackingProvider>) {
        self.providers.insert(carrier, provider);
    }

    /// Provider responsible for `carrier`.
    pub fn get(&self, carrier: Carrier) -> Arc<dyn TrackingProvider> {
        self.providers
            .get(&carrier)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Whether a dedicated provider exists for `carrier`.
    pub fn has_provider(&self, carrier: Carrier) -> bool {
        self.providers.contains_key(&carrier)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut carriers: Vec<_> = self.providers.keys().map(|c| c.as_str()).collect();
        carriers.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("carriers", &carriers)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;

    #[test]
    fn test_unregistered_carrier_uses_fallback() {
        let fallback = Arc::new(MockProvider::named("generic"));
        let registry = ProviderRegistry::new(fallback);

        assert_eq!(registry.get(Carrier::Ups).name(), "generic");
        assert_eq!(registry.get(Carrier::Unknown).name(), "generic");
        assert!(!registry.has_provider(Carrier::Ups));
    }

    #[test]
    fn test_registered_carrier_resolves() {
        let registry = ProviderRegistry::new(Arc::new(MockProvider::named("generic")))
            .with_provider(Carrier::Ups, Arc::new(MockProvider::named("ups")));

        assert_eq!(registry.get(Carrier::Ups).name(), "ups");
        assert_eq!(registry.get(Carrier::Fedex).name(), "generic");
        assert!(registry.has_provider(Carrier::Ups));
    }
}
