use std::time::Instant;
use uuid::Uuid;

use crate::{
    config::PipelineSettings,
    db::ProfileStore,
    error::{AppError, AppResult},
    models::{ProductItem, ProductView},
    services::{
        catalog::SharedCatalog,
        composer::compose_pool,
        gateway::{CandidateQuery, CatalogGateway, MatchPrecision},
        style_filter::filter_by_style,
    },
};

/// Generates capsule recommendations for a user
///
/// Runs search → resolve → compose → style filter → truncate against one pinned
/// catalog snapshot:
/// 1. Find items fitting the primary body type and any lifestyle tag
/// 2. Hydrate the identifiers from the snapshot
/// 3. Sample a pool with the user's statement/basic mix
/// 4. Keep items sharing a style with the user's top styles
/// 5. Cap the result and project it to the public view
///
/// Sampling is random, so repeated calls may return different items.
pub async fn recommend_for_user(
    profiles: &dyn ProfileStore,
    catalog: &SharedCatalog,
    gateway: &dyn CatalogGateway,
    settings: &PipelineSettings,
    user_id: Uuid,
) -> AppResult<Vec<ProductView>> {
    let start = Instant::now();

    let profile = profiles
        .get(user_id)
        .await?
        .filter(|profile| profile.is_complete())
        .ok_or(AppError::ProfileNotFound(user_id))?;

    let snapshot = catalog.current();
    let query = CandidateQuery {
        body_type: profile.primary_body_type.clone().unwrap_or_default(),
        lifestyle_tags: profile.lifestyle_tags(),
        limit: settings.candidate_limit,
    };

    if gateway.precision() == MatchPrecision::Degraded {
        tracing::warn!(
            user_id = %user_id,
            backend = gateway.name(),
            "Recommending from a degraded search backend"
        );
    }

    // 1. Candidate universe
    let ids = gateway.search(&snapshot, &query).await?;

    // 2. Hydrate
    let candidates = snapshot.resolve(&ids);

    // 3. Compose; the generator must not live across an await
    let statement_ratio = profile.statement_ratio(settings.default_statement_ratio);
    let pool = compose_pool(
        candidates,
        statement_ratio,
        settings.pool_size,
        &mut rand::thread_rng(),
    );

    // 4. Style filter
    let styled = filter_by_style(pool.items, &profile.top_style_tags());

    // 5. Truncate and project
    let recommendations = project(styled, settings.max_results);

    tracing::info!(
        user_id = %user_id,
        catalog_version = snapshot.version(),
        backend = gateway.name(),
        candidates = ids.len(),
        statement = pool.statement_count,
        basic = pool.basic_count,
        backfilled = pool.backfilled,
        returned = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Recommendations generated"
    );

    Ok(recommendations)
}

/// Keeps at most `max_results` items, projected to the public view
pub fn project(items: Vec<ProductItem>, max_results: usize) -> Vec<ProductView> {
    items
        .into_iter()
        .take(max_results)
        .map(ProductView::from)
        .collect()
}
