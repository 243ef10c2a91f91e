use std::sync::Arc;
use tokio::time::interval;

use crate::AppState;

/// Periodic sweep of servers that stopped reporting, on top of the per-request reap.
pub async fn start_background_task(state: Arc<AppState>) {
    let period = state.config.reaper_interval;
    if period.is_zero() {
        tracing::info!("Background reaper disabled");
        return;
    }

    tracing::info!("Background Task Started: stale server reaper every {:?}", period);
    let mut interval = interval(period);

    loop {
        interval.tick().await;
        match state.store.reap_stale(state.config.stale_after).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!("Background reaper removed {} stale servers", removed),
            Err(e) => tracing::error!("Background Task Error: {}", e),
        }
    }
}
