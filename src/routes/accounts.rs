use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Account, NewAccount},
    services::accounts,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        }
    }
}

/// Registers an account together with its empty profile
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewAccount>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let account =
        accounts::create_account(state.accounts.as_ref(), state.profiles.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}
