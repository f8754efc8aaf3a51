//! Candidate search backends
//!
//! A gateway answers "which catalog items fit this body type and any of these
//! lifestyle tags". Structured backends match exact tokens; the substring
//! backend is a lower-precision fallback for when no structured index exists.

use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{ItemId, TagSet},
    services::catalog::CatalogSnapshot,
};

pub mod cached;
pub mod elasticsearch;
pub mod substring;
pub mod tag_index;

pub use cached::CachedGateway;
pub use elasticsearch::ElasticsearchGateway;
pub use substring::SubstringGateway;
pub use tag_index::TagIndexGateway;

/// How closely a backend honors token semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPrecision {
    /// Exact, case-insensitive token matching
    Exact,
    /// Substring containment on raw delimited text
    Degraded,
}

/// Search parameters for one recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub body_type: String,
    pub lifestyle_tags: TagSet,
    /// Upper bound on returned identifiers
    pub limit: usize,
}

/// Trait for candidate search backends
///
/// `catalog` is the snapshot pinned by the caller. In-process backends search it
/// directly; remote backends use its version to address the matching index.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Finds items compatible with the body type whose lifestyle intersects the tags
    ///
    /// An unreachable backend is an error (`CatalogUnavailable`), never an empty set.
    async fn search(
        &self,
        catalog: &CatalogSnapshot,
        query: &CandidateQuery,
    ) -> AppResult<HashSet<ItemId>>;

    /// Makes a freshly imported snapshot searchable before it is swapped in
    async fn reindex(&self, _catalog: &CatalogSnapshot) -> AppResult<()> {
        Ok(())
    }

    /// Makes an already activated snapshot searchable, reusing a complete index
    async fn ensure_indexed(&self, catalog: &CatalogSnapshot) -> AppResult<()> {
        self.reindex(catalog).await
    }

    /// Drops search state for every catalog version not in `keep`
    async fn prune(&self, _keep: &[i64]) -> AppResult<()> {
        Ok(())
    }

    fn precision(&self) -> MatchPrecision;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Keeps at most `limit` identifiers, preferring the lowest IDs so capping is stable
pub(crate) fn cap_candidates<I>(ids: I, limit: usize) -> HashSet<ItemId>
where
    I: IntoIterator<Item = ItemId>,
{
    let mut ids: Vec<ItemId> = ids.into_iter().collect();
    if ids.len() > limit {
        ids.sort_unstable();
        ids.truncate(limit);
    }
    ids.into_iter().collect()
}
