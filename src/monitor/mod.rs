//! Monitors and the [`Scope`] context that owns them.
//!
//! A `Scope` is built once from a validated [`ScopeConfig`] and handed to
//! whatever needs to instrument clients or storages. Dropping it (and the
//! clients it instrumented) releases all captured state.

pub mod api;
pub mod auth;
pub mod session;

use std::sync::Arc;

pub use api::{AnalysisReport, ApiMonitor, RequestAnalysis, Timing};
pub use auth::AuthMonitor;
pub use session::SessionMonitor;

use crate::Result;
use crate::config::ScopeConfig;
use crate::http::{IntoObserved, ObservedClient};
use crate::storage::{KeyValueStorage, ObservedStorage};

pub struct Scope {
    config: ScopeConfig,
    api: Arc<ApiMonitor>,
    auth: Arc<AuthMonitor>,
    sessions: Arc<SessionMonitor>,
}

impl Scope {
    pub fn new(config: ScopeConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Observing hosts containing {:?}", config.domain_filter);
        Ok(Self {
            api: Arc::new(ApiMonitor::new(&config)),
            auth: Arc::new(AuthMonitor::new(&config)),
            sessions: Arc::new(SessionMonitor::new(&config)),
            config,
        })
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<ApiMonitor> {
        &self.api
    }

    pub fn auth(&self) -> &Arc<AuthMonitor> {
        &self.auth
    }

    pub fn sessions(&self) -> &Arc<SessionMonitor> {
        &self.sessions
    }

    /// Wrap `client` with all three monitors.
    ///
    /// Instrumenting an already instrumented client adds no second layer, so
    /// each call is still recorded once.
    pub fn instrument<T: IntoObserved>(&self, client: T) -> ObservedClient<T::Client> {
        client
            .into_observed(&self.config.domain_filter)
            .add_observer(self.api.clone())
            .add_observer(self.auth.clone())
            .add_observer(self.sessions.clone())
    }

    /// Wrap a storage so credential keys are reported
    pub fn instrument_storage<S: KeyValueStorage>(&self, storage: S, name: &str) -> ObservedStorage<S> {
        ObservedStorage::new(storage, name, self.auth.clone())
    }

    pub fn clear(&self) {
        self.api.clear();
        self.auth.clear();
        self.sessions.clear();
    }
}
