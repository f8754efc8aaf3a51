use crate::{
    db::{AccountStore, ProfileStore},
    error::AppResult,
    models::{Account, NewAccount},
};

/// Registers an account and materializes its empty preference profile
///
/// Profile creation is an explicit post-creation step. It is idempotent, and a
/// quiz submission upserts the profile anyway, so a failure between the two
/// steps leaves nothing that a retry or the quiz cannot repair.
pub async fn create_account(
    accounts: &dyn AccountStore,
    profiles: &dyn ProfileStore,
    request: NewAccount,
) -> AppResult<Account> {
    let request = request.validated()?;
    let account = accounts.create(request).await?;

    profiles.create_empty(account.id).await?;

    tracing::info!(user_id = %account.id, "Account created with empty profile");

    Ok(account)
}
