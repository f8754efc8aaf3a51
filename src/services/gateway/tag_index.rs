use std::collections::HashSet;

use super::{cap_candidates, CandidateQuery, CatalogGateway, MatchPrecision};
use crate::{error::AppResult, models::ItemId, services::catalog::CatalogSnapshot};

/// Structured search over the snapshot's inverted tag index
#[derive(Debug, Clone, Copy, Default)]
pub struct TagIndexGateway;

impl TagIndexGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CatalogGateway for TagIndexGateway {
    async fn search(
        &self,
        catalog: &CatalogSnapshot,
        query: &CandidateQuery,
    ) -> AppResult<HashSet<ItemId>> {
        let Some(body_matches) = catalog.with_body_type(&query.body_type) else {
            return Ok(HashSet::new());
        };
        let lifestyle_matches = catalog.with_any_lifestyle(&query.lifestyle_tags);

        let matched = body_matches
            .iter()
            .filter(|id| lifestyle_matches.contains(id))
            .cloned();

        Ok(cap_candidates(matched, query.limit))
    }

    fn precision(&self) -> MatchPrecision {
        MatchPrecision::Exact
    }

    fn name(&self) -> &'static str {
        "tag_index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagSet;
    use crate::services::catalog::test_support::item;

    fn query(body_type: &str, lifestyle: &str, limit: usize) -> CandidateQuery {
        CandidateQuery {
            body_type: body_type.to_string(),
            lifestyle_tags: TagSet::parse(lifestyle),
            limit,
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(
            1,
            vec![
                item("1", "Pear,Apple", "Social", "Classic", "Basic"),
                item("2", "Pear", "Lounge", "Edgy", "Statement"),
                item("3", "Pearl", "Social", "Classic", "Basic"),
                item("4", "Pear", "Business Formal", "Classic", "Basic"),
                item("5", "Apple", "Social", "Classic", "Basic"),
            ],
        )
    }

    #[tokio::test]
    async fn test_search_requires_body_type_and_lifestyle() {
        let gateway = TagIndexGateway::new();
        let ids = gateway
            .search(&snapshot(), &query("pear", "Social,Lounge", 500))
            .await
            .unwrap();
        let mut ids: Vec<_> = ids.into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_search_unknown_body_type_is_empty() {
        let gateway = TagIndexGateway::new();
        let ids = gateway
            .search(&snapshot(), &query("Hourglass", "Social", 500))
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_search_without_lifestyle_tags_is_empty() {
        let gateway = TagIndexGateway::new();
        let ids = gateway
            .search(&snapshot(), &query("Pear", "", 500))
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let gateway = TagIndexGateway::new();
        let ids = gateway
            .search(&snapshot(), &query("Pear", "Social,Lounge,Business Formal", 2))
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
    }
}
