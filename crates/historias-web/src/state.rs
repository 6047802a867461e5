//! Shared application state for the web server.

use historias_client::{load_dashboard, HistoriasBackend};
use historias_common::ClinicalRecord;
use historias_view::state::LoadStatus;
use historias_view::{Dashboard, LoadState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::ApiError;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub backend: Arc<dyn HistoriasBackend>,
    load: RwLock<LoadState>,
    /// Bumped under the `load` write lock whenever a reload starts or lands.
    generation: AtomicU64,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(backend: Arc<dyn HistoriasBackend>) -> Self {
        Self { backend, load: RwLock::new(LoadState::Loading), generation: AtomicU64::new(0) }
    }

    /// Run the initial load again. The view is `Loading` until it settles.
    ///
    /// When a newer reload starts before this one lands, this result is
    /// dropped and the newer one decides the state.
    pub async fn reload(&self) -> LoadStatus {
        let started = {
            let mut guard = self.load.write().await;
            *guard = LoadState::Loading;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        let next = match load_dashboard(self.backend.as_ref()).await {
            Ok(dashboard) => LoadState::Ready(dashboard),
            Err(e) => LoadState::Failed(e.to_string()),
        };

        let mut guard = self.load.write().await;
        if self.generation.load(Ordering::SeqCst) != started {
            debug!(started, "Load superseded by a newer reload");
            return guard.status();
        }
        let status = next.status();
        info!(status = status.status, "Load state changed");
        *guard = next;
        self.generation.fetch_add(1, Ordering::SeqCst);
        status
    }

    /// Current load generation. Capture it before a backend write and hand it
    /// back to [`AppState::store_saved`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> LoadStatus {
        self.load.read().await.status()
    }

    /// Run `f` against the loaded dashboard.
    pub async fn with_dashboard<T>(&self, f: impl FnOnce(&Dashboard) -> T) -> Result<T, ApiError> {
        match &*self.load.read().await {
            LoadState::Ready(dashboard) => Ok(f(dashboard)),
            LoadState::Loading => Err(ApiError::Loading),
            LoadState::Failed(msg) => Err(ApiError::LoadFailed(msg.clone())),
        }
    }

    /// Put a saved record into the store.
    ///
    /// Returns `false` without touching the store when the dashboard is not
    /// loaded or a reload started or landed since `seen_generation`. The
    /// reloaded data wins in that case; the caller should reload again to
    /// pick the record up from the backend.
    pub async fn store_saved(&self, record: ClinicalRecord, seen_generation: u64) -> bool {
        let mut guard = self.load.write().await;
        if self.generation.load(Ordering::SeqCst) != seen_generation {
            return false;
        }
        match std::mem::take(&mut *guard) {
            LoadState::Ready(dashboard) => {
                *guard = LoadState::Ready(dashboard.with_saved(record));
                true
            }
            other => {
                *guard = other;
                false
            }
        }
    }
}
