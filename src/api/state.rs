//! Application state for the payroll API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::audit::{AuditSink, TracingAuditSink};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigLoader, EngineConfig};
use crate::services::Services;
use crate::store::{MemoryStore, Store};

/// Shared application state.
///
/// Holds the loaded configuration and the services wired to one store,
/// audit sink and clock.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    services: Arc<Services>,
}

impl AppState {
    /// Creates the state from a configuration and explicit collaborators.
    pub fn new(
        config: ConfigLoader,
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let services = Services::new(store, audit, clock, config.config().clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    /// An in-memory store, tracing audit sink and the system clock.
    pub fn in_memory(config: ConfigLoader) -> Self {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(TracingAuditSink),
            Arc::new(SystemClock),
        )
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        self.config.config()
    }

    /// Returns the services.
    pub fn services(&self) -> &Services {
        &self.services
    }
}
