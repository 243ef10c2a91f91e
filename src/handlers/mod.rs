use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;

pub mod catalog;
pub mod players;
pub mod server;
pub mod stats;

/// Lazy eviction run at the top of every handler.
pub async fn reap_stale(state: &AppState) -> anyhow::Result<()> {
    let removed = state.store.reap_stale(state.config.stale_after).await?;
    if removed > 0 {
        tracing::debug!("Reaped {} stale servers", removed);
    }
    Ok(())
}

pub fn store_failure(action: &str, e: anyhow::Error) -> Response {
    tracing::error!("{} failed: {:#}", action, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error: {} failed: {}", action, e),
    )
        .into_response()
}
