use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::handlers::{reap_stale, store_failure};
use crate::models::catalog::{CatalogEntry, CatalogKind, CatalogQuery};
use crate::AppState;

async fn catalog_listing(state: &AppState, kind: CatalogKind, query: &CatalogQuery) -> Response {
    if let Err(e) = reap_stale(state).await {
        return store_failure("Removing stale servers", e);
    }

    match state.store.catalog(kind).await {
        Ok(entries) => (
            StatusCode::OK,
            render_catalog(&entries, query.glest_version.as_deref()),
        )
            .into_response(),
        Err(e) => store_failure(&format!("Reading {}", kind.table()), e),
    }
}

pub fn render_catalog(entries: &[CatalogEntry], client_version: Option<&str>) -> String {
    entries
        .iter()
        .filter(|e| e.available_to(client_version))
        .map(CatalogEntry::legacy_line)
        .collect()
}

#[utoipa::path(
    get,
    path = "/showMapsForGlest.php",
    params(CatalogQuery),
    responses((status = 200, description = "Maps as `name|crc|description|url|imageUrl|` lines", body = String, content_type = "text/plain"))
)]
pub async fn list_maps(State(state): State<Arc<AppState>>, Query(query): Query<CatalogQuery>) -> Response {
    catalog_listing(&state, CatalogKind::Maps, &query).await
}

#[utoipa::path(
    get,
    path = "/showTechsForGlest.php",
    params(CatalogQuery),
    responses((status = 200, description = "Techtrees as `name|crc|description|url|imageUrl|` lines", body = String, content_type = "text/plain"))
)]
pub async fn list_techs(State(state): State<Arc<AppState>>, Query(query): Query<CatalogQuery>) -> Response {
    catalog_listing(&state, CatalogKind::Techs, &query).await
}

#[utoipa::path(
    get,
    path = "/showTilesetsForGlest.php",
    params(CatalogQuery),
    responses((status = 200, description = "Tilesets as `name|crc|description|url|imageUrl|` lines", body = String, content_type = "text/plain"))
)]
pub async fn list_tilesets(State(state): State<Arc<AppState>>, Query(query): Query<CatalogQuery>) -> Response {
    catalog_listing(&state, CatalogKind::Tilesets, &query).await
}

#[utoipa::path(
    get,
    path = "/showScenariosForGlest.php",
    params(CatalogQuery),
    responses((status = 200, description = "Scenarios as `name|crc|description|url|imageUrl|` lines", body = String, content_type = "text/plain"))
)]
pub async fn list_scenarios(State(state): State<Arc<AppState>>, Query(query): Query<CatalogQuery>) -> Response {
    catalog_listing(&state, CatalogKind::Scenarios, &query).await
}
