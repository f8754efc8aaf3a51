use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Account, NewAccount, ProductItem, UserPreferenceProfile},
};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::{MemoryAccountStore, MemoryCatalogRepository, MemoryProfileStore};
pub use postgres::{create_pool, PgAccountStore, PgCatalogRepository, PgProfileStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;

/// Storage for quiz-derived preference profiles
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserPreferenceProfile>>;

    /// Materializes an empty profile; an existing profile is left untouched
    async fn create_empty(&self, user_id: Uuid) -> AppResult<()>;

    /// Overwrites the whole profile, creating it when missing
    async fn save(&self, profile: &UserPreferenceProfile) -> AppResult<()>;
}

/// Storage for registered accounts
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken
    async fn create(&self, account: NewAccount) -> AppResult<Account>;

    async fn exists(&self, id: Uuid) -> AppResult<bool>;
}

/// Persistent catalog, one immutable version per import
///
/// An import stages a version, makes it searchable and only then activates it.
/// Readers only ever see activated versions.
#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Latest activated version with its items; version 0 when nothing is live
    async fn load_latest(&self) -> AppResult<(i64, Vec<ProductItem>)>;

    /// Latest activated version, 0 when nothing is live
    async fn active_version(&self) -> AppResult<i64>;

    /// Stores the items under a new, not yet active version and returns it
    async fn stage(&self, items: &[ProductItem]) -> AppResult<i64>;

    /// Makes a staged version live and drops every older version
    async fn activate(&self, version: i64) -> AppResult<()>;

    /// Drops a staged version that will never be activated
    async fn discard(&self, version: i64) -> AppResult<()>;
}
