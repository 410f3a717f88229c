//! Aggregator registry
//!
//! Lookup table keyed by delivery service, built once at startup and
//! consulted once per status update.

use shared::order::DeliveryService;
use std::collections::HashMap;
use std::sync::Arc;

use super::client::AggregatorClient;

#[derive(Default, Clone)]
pub struct AggregatorRegistry {
    clients: HashMap<DeliveryService, Arc<dyn AggregatorClient>>,
}

impl AggregatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under its own service; replaces any previous one
    pub fn register(&mut self, client: Arc<dyn AggregatorClient>) -> &mut Self {
        let service = client.service();
        if self.clients.insert(service, client).is_some() {
            tracing::warn!(service = %service, "Aggregator client replaced");
        }
        self
    }

    pub fn with(mut self, client: Arc<dyn AggregatorClient>) -> Self {
        self.register(client);
        self
    }

    pub fn get(&self, service: DeliveryService) -> Option<Arc<dyn AggregatorClient>> {
        self.clients.get(&service).cloned()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
