use std::collections::HashSet;
use std::sync::Arc;

use super::{CandidateQuery, CatalogGateway, MatchPrecision};
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::ItemId,
    services::catalog::CatalogSnapshot,
};

/// Caches another gateway's results in Redis, keyed by catalog version
pub struct CachedGateway {
    inner: Arc<dyn CatalogGateway>,
    cache: Cache,
    ttl: u64,
}

impl CachedGateway {
    pub fn new(inner: Arc<dyn CatalogGateway>, cache: Cache, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait::async_trait]
impl CatalogGateway for CachedGateway {
    async fn search(
        &self,
        catalog: &CatalogSnapshot,
        query: &CandidateQuery,
    ) -> AppResult<HashSet<ItemId>> {
        let key = CacheKey::candidate_search(
            catalog.version(),
            &query.body_type,
            &query.lifestyle_tags,
            query.limit,
        );

        cached!(self.cache, key, self.ttl, async {
            self.inner.search(catalog, query).await
        })
    }

    async fn reindex(&self, catalog: &CatalogSnapshot) -> AppResult<()> {
        // Keys are versioned, so entries for older catalogs simply expire
        self.inner.reindex(catalog).await
    }

    async fn ensure_indexed(&self, catalog: &CatalogSnapshot) -> AppResult<()> {
        self.inner.ensure_indexed(catalog).await
    }

    async fn prune(&self, keep: &[i64]) -> AppResult<()> {
        self.inner.prune(keep).await
    }

    fn precision(&self) -> MatchPrecision {
        self.inner.precision()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
