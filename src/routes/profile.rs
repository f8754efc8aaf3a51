use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::UserPreferenceProfile,
    state::AppState,
};

/// Returns the caller's stored profile, complete or not
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<UserPreferenceProfile>> {
    let profile = state
        .profiles
        .get(user_id)
        .await?
        .ok_or(AppError::ProfileNotFound(user_id))?;
    Ok(Json(profile))
}
