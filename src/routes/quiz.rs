use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::UserPreferenceProfile,
    services::quiz::{self, QuizSubmission},
    state::AppState,
};

/// Stores the caller's quiz answers as their preference profile
pub async fn submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(submission): Json<QuizSubmission>,
) -> AppResult<Json<UserPreferenceProfile>> {
    let profile = quiz::submit_quiz(
        state.accounts.as_ref(),
        state.profiles.as_ref(),
        user_id,
        submission,
    )
    .await?;
    Ok(Json(profile))
}
