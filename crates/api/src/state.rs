//! Application state shared across handlers.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::db::{DocumentStore, MemoryStore};
use crate::services::{ResourceService, UserService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the document stores and the clock.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    clock: Arc<dyn Clock>,
    durable: Option<Arc<dyn DocumentStore>>,
    resources: ResourceService,
    mock_resources: ResourceService,
    users: UserService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `durable` - Durable store, or `None` to run in fallback mode
    ///
    /// The mock store is always created. In fallback mode the durable
    /// routes are served from it as well.
    #[must_use]
    pub fn new(durable: Option<Arc<dyn DocumentStore>>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let mock: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let primary = durable.clone().unwrap_or_else(|| mock.clone());

        Self {
            inner: Arc::new(AppStateInner {
                durable,
                resources: ResourceService::new(primary.clone(), clock.clone()),
                mock_resources: ResourceService::new(mock, clock.clone()),
                users: UserService::new(primary, clock.clone()),
                clock,
            }),
        }
    }

    /// State with no durable store.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(None)
    }

    /// Clock shared by every service, for server-side timestamps.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Get the durable store, if one is configured.
    #[must_use]
    pub fn durable(&self) -> Option<&Arc<dyn DocumentStore>> {
        self.inner.durable.as_ref()
    }

    /// Whether requests are persisted beyond the process lifetime.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.inner.durable.is_some()
    }

    /// CRUD over the durable store (mock store in fallback mode).
    #[must_use]
    pub fn resources(&self) -> &ResourceService {
        &self.inner.resources
    }

    /// CRUD over the mock store.
    #[must_use]
    pub fn mock_resources(&self) -> &ResourceService {
        &self.inner.mock_resources
    }

    /// User profiles, signup and login.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.users
    }
}
