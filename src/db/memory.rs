use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, CatalogRepository, ProfileStore};
use crate::{
    error::{AppError, AppResult},
    models::{Account, NewAccount, ProductItem, UserPreferenceProfile},
};

/// In-process profile storage for tests and database-less runs
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, UserPreferenceProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserPreferenceProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn create_empty(&self, user_id: Uuid) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .entry(user_id)
            .or_insert_with(|| UserPreferenceProfile::empty(user_id));
        Ok(())
    }

    async fn save(&self, profile: &UserPreferenceProfile) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(())
    }
}

/// In-process account storage
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: NewAccount) -> AppResult<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::Conflict(format!(
                "An account already exists for {}",
                account.email
            )));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.accounts.read().await.contains_key(&id))
    }
}

#[derive(Default)]
struct CatalogState {
    last_version: i64,
    active_version: i64,
    active: Vec<ProductItem>,
    staged: HashMap<i64, Vec<ProductItem>>,
}

/// In-process catalog storage
#[derive(Default)]
pub struct MemoryCatalogRepository {
    state: RwLock<CatalogState>,
}

impl MemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn load_latest(&self) -> AppResult<(i64, Vec<ProductItem>)> {
        let state = self.state.read().await;
        Ok((state.active_version, state.active.clone()))
    }

    async fn active_version(&self) -> AppResult<i64> {
        Ok(self.state.read().await.active_version)
    }

    async fn stage(&self, items: &[ProductItem]) -> AppResult<i64> {
        let mut state = self.state.write().await;
        state.last_version += 1;
        let version = state.last_version;
        state.staged.insert(version, items.to_vec());
        Ok(version)
    }

    async fn activate(&self, version: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        let items = state.staged.remove(&version).ok_or_else(|| {
            AppError::NotFound(format!("No staged catalog version {}", version))
        })?;

        if version > state.active_version {
            state.active_version = version;
            state.active = items;
        }
        state.staged.retain(|staged, _| *staged > version);

        Ok(())
    }

    async fn discard(&self, version: i64) -> AppResult<()> {
        self.state.write().await.staged.remove(&version);
        Ok(())
    }
}
