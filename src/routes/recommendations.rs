use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::ProductView,
    services::recommendations,
    state::AppState,
};

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<ProductView>>> {
    let recommendations = recommendations::recommend_for_user(
        state.profiles.as_ref(),
        &state.catalog,
        state.gateway.as_ref(),
        &state.settings,
        user_id,
    )
    .await?;
    Ok(Json(recommendations))
}
