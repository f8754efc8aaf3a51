use crate::models::{ProductItem, TagSet};

/// Keeps items sharing at least one style token with the user's top styles
///
/// An empty style set means no recorded preference, and the pool passes through.
pub fn filter_by_style(pool: Vec<ProductItem>, top_styles: &TagSet) -> Vec<ProductItem> {
    if top_styles.is_empty() {
        return pool;
    }

    pool.into_iter()
        .filter(|item| item.style.intersects(top_styles))
        .collect()
}
