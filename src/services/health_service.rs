use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report backend health for the `/healthcheck` route.
///
/// Pings the installed store so connectivity problems show up in the logs,
/// but the reported status only reflects whether a store is installed; the
/// supervisor owns the degraded transition itself.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_room_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
            HealthResponse::ok()
        }
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            HealthResponse::degraded()
        }
    }
}
