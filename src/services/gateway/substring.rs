use std::collections::HashSet;

use super::{cap_candidates, CandidateQuery, CatalogGateway, MatchPrecision};
use crate::{error::AppResult, models::ItemId, services::catalog::CatalogSnapshot};

/// Lower-precision search by substring containment on the raw delimited text
///
/// Only for deployments without a structured index. It over-matches on prefix
/// and suffix collisions (`"Pear"` matches `"Pearl"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringGateway;

impl SubstringGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CatalogGateway for SubstringGateway {
    async fn search(
        &self,
        catalog: &CatalogSnapshot,
        query: &CandidateQuery,
    ) -> AppResult<HashSet<ItemId>> {
        tracing::warn!(
            backend = self.name(),
            "Degraded candidate search: substring matching may return false positives"
        );

        let body_type = query.body_type.trim().to_lowercase();
        let lifestyle: Vec<String> = query
            .lifestyle_tags
            .iter()
            .map(str::to_lowercase)
            .collect();

        let matched = catalog
            .items()
            .filter(|item| {
                let body_text = item.body_type.to_delimited().to_lowercase();
                let lifestyle_text = item.lifestyle.to_delimited().to_lowercase();
                !body_type.is_empty()
                    && body_text.contains(&body_type)
                    && lifestyle.iter().any(|tag| lifestyle_text.contains(tag))
            })
            .map(|item| item.item_id.clone());

        Ok(cap_candidates(matched, query.limit))
    }

    fn precision(&self) -> MatchPrecision {
        MatchPrecision::Degraded
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagSet;
    use crate::services::catalog::test_support::item;

    #[tokio::test]
    async fn test_substring_search_over_matches_prefixes() {
        let snapshot = CatalogSnapshot::new(
            1,
            vec![
                item("1", "Pear", "Social", "Classic", "Basic"),
                item("2", "Pearl", "Social", "Classic", "Basic"),
                item("3", "Apple", "Social", "Classic", "Basic"),
            ],
        );
        let query = CandidateQuery {
            body_type: "Pear".to_string(),
            lifestyle_tags: TagSet::parse("social"),
            limit: 500,
        };

        let gateway = SubstringGateway::new();
        let ids = gateway.search(&snapshot, &query).await.unwrap();

        assert_eq!(gateway.precision(), MatchPrecision::Degraded);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("2"));
    }
}
