use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::AdminAccess,
    models::CatalogFeedRow,
    services::import::{self, ImportSummary},
    state::AppState,
};

/// Replaces the catalog with the posted feed rows; requires the admin token
pub async fn import(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Json(rows): Json<Vec<CatalogFeedRow>>,
) -> AppResult<Json<ImportSummary>> {
    let summary = import::import_catalog(
        state.catalog_repository.as_ref(),
        state.gateway.as_ref(),
        &state.catalog,
        rows,
    )
    .await?;
    Ok(Json(summary))
}
