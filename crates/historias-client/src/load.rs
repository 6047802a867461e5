//! Initial dashboard load: records and metrics fetched concurrently.

use historias_common::{DashboardError, Result};
use historias_view::Dashboard;
use tracing::{info, instrument, warn};

use crate::backend::HistoriasBackend;

/// Fetch records and metric samples together. Ready only when both succeed;
/// the first failure, or the combined load outliving the backend timeout,
/// fails the whole load.
#[instrument(skip(backend))]
pub async fn load_dashboard(backend: &dyn HistoriasBackend) -> Result<Dashboard> {
    let limit = backend.timeout();
    let joined = tokio::time::timeout(limit, async {
        tokio::try_join!(backend.fetch_historias(), backend.fetch_metrics())
    })
    .await;

    match joined {
        Ok(Ok((records, samples))) => {
            info!(records = records.len(), samples = samples.len(), "Dashboard loaded");
            Ok(Dashboard::new(records, samples))
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Dashboard load failed");
            Err(e)
        }
        Err(_) => {
            warn!(?limit, "Dashboard load timed out");
            Err(DashboardError::Timeout(limit))
        }
    }
}
