use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::ProductItem;

/// Absorbs float representation error in `pool_size * ratio` (0.29 * 100 = 28.999..)
const RATIO_EPSILON: f64 = 1e-9;

/// A pool sampled to a statement/basic mix
#[derive(Debug, Clone)]
pub struct ComposedPool {
    pub items: Vec<ProductItem>,
    pub statement_count: usize,
    pub basic_count: usize,
    /// Slots filled from the other class because one class ran short
    pub backfilled: usize,
}

/// Per-class quotas for a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quotas {
    pub pool_size: usize,
    pub statement: usize,
    pub basic: usize,
}

impl Quotas {
    /// `pool_size = min(candidates, max_pool)`, `statement = floor(pool_size * ratio)`
    pub fn new(candidates: usize, max_pool: usize, statement_ratio: f64) -> Self {
        let pool_size = candidates.min(max_pool);
        let ratio = if statement_ratio.is_nan() {
            0.0
        } else {
            statement_ratio.clamp(0.0, 1.0)
        };
        let statement = ((pool_size as f64 * ratio + RATIO_EPSILON).floor() as usize).min(pool_size);

        Self {
            pool_size,
            statement,
            basic: pool_size - statement,
        }
    }
}

/// Samples a bounded pool with the requested share of statement pieces
///
/// Both classes are sampled uniformly without replacement. When a class has fewer
/// members than its quota, the shortfall is backfilled from the other class, so
/// the pool always reaches `min(candidates.len(), max_pool)` items.
pub fn compose_pool<R: Rng + ?Sized>(
    candidates: Vec<ProductItem>,
    statement_ratio: f64,
    max_pool: usize,
    rng: &mut R,
) -> ComposedPool {
    let quotas = Quotas::new(candidates.len(), max_pool, statement_ratio);

    let (mut statement, mut basic): (Vec<ProductItem>, Vec<ProductItem>) =
        candidates.into_iter().partition(ProductItem::is_statement);
    statement.shuffle(rng);
    basic.shuffle(rng);

    let mut take_statement = quotas.statement.min(statement.len());
    let mut take_basic = quotas.basic.min(basic.len());

    let statement_short = quotas.statement - take_statement;
    let basic_short = quotas.basic - take_basic;
    let statement_backfill = basic_short.min(statement.len() - take_statement);
    let basic_backfill = statement_short.min(basic.len() - take_basic);
    take_statement += statement_backfill;
    take_basic += basic_backfill;

    if statement_backfill + basic_backfill > 0 {
        tracing::debug!(
            statement_available = statement.len(),
            basic_available = basic.len(),
            statement_quota = quotas.statement,
            basic_quota = quotas.basic,
            statement_backfill,
            basic_backfill,
            "Utility class short of quota, backfilled from the other class"
        );
    }

    statement.truncate(take_statement);
    basic.truncate(take_basic);

    let mut items = statement;
    items.append(&mut basic);

    ComposedPool {
        items,
        statement_count: take_statement,
        basic_count: take_basic,
        backfilled: statement_backfill + basic_backfill,
    }
}
