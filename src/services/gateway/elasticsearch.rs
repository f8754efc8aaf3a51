//! Elasticsearch candidate search
//!
//! Every catalog version gets its own index, `{prefix}-v{version}`, holding the
//! normalized tag tokens as keyword arrays. Searches address the index of the
//! snapshot the caller pinned, so a request never mixes two catalog versions.
//!
//! Index lifecycle on import:
//! 1. `PUT /{prefix}-v{n}` with the keyword mapping
//! 2. `POST /{prefix}-v{n}/_bulk?refresh=true` with one document per item
//! 3. after the swap, every index other than `v{n}` and the replaced live
//!    version is deleted; in-flight requests may still hold the latter

use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;

use super::{CandidateQuery, CatalogGateway, MatchPrecision};
use crate::{
    error::{AppError, AppResult},
    models::{ItemId, ProductItem, TagSet},
    services::catalog::CatalogSnapshot,
};

/// Documents per bulk request
const BULK_CHUNK_SIZE: usize = 500;

#[derive(Clone)]
pub struct ElasticsearchGateway {
    http_client: HttpClient,
    base_url: String,
    index_prefix: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    errors: bool,
}

#[derive(Debug, Deserialize)]
struct CatIndex {
    index: String,
}

impl ElasticsearchGateway {
    pub fn new(base_url: String, index_prefix: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            index_prefix,
        }
    }

    /// Index holding the given catalog version
    pub fn index_name(&self, version: i64) -> String {
        format!("{}-v{}", self.index_prefix, version)
    }

    /// Catalog version held by an index of this gateway, if the name is one
    fn index_version(&self, index: &str) -> Option<i64> {
        index
            .strip_prefix(&self.index_prefix)?
            .strip_prefix("-v")?
            .parse()
            .ok()
    }

    /// Versioned indices whose version is not kept
    fn stale_indices(&self, indices: Vec<String>, keep: &[i64]) -> Vec<String> {
        indices
            .into_iter()
            .filter(|index| {
                self.index_version(index)
                    .is_some_and(|version| !keep.contains(&version))
            })
            .collect()
    }

    /// Query body: exact body type token and any lifestyle token
    fn search_body(query: &CandidateQuery) -> Value {
        let lifestyle: Vec<&str> = query.lifestyle_tags.keys().collect();
        json!({
            "size": query.limit,
            "_source": false,
            // Lowest IDs first, so a capped result is deterministic
            "sort": [{ "item_id": "asc" }],
            "query": {
                "bool": {
                    "filter": [
                        { "term": { "body_type": crate::models::tag_key(&query.body_type) } },
                        { "terms": { "lifestyle": lifestyle } }
                    ]
                }
            }
        })
    }

    fn index_definition() -> Value {
        json!({
            "settings": {
                "number_of_shards": 1,
                "number_of_replicas": 0
            },
            "mappings": {
                "properties": {
                    "item_id": { "type": "keyword" },
                    "category": { "type": "keyword" },
                    "style": { "type": "keyword" },
                    "body_type": { "type": "keyword" },
                    "lifestyle": { "type": "keyword" },
                    "utility": { "type": "keyword" }
                }
            }
        })
    }

    fn document(item: &ProductItem) -> Value {
        let keys = |tags: &TagSet| tags.keys().map(str::to_string).collect::<Vec<_>>();
        json!({
            "item_id": item.item_id,
            "category": item.category,
            "style": keys(&item.style),
            "body_type": keys(&item.body_type),
            "lifestyle": keys(&item.lifestyle),
            "utility": keys(&item.utility),
        })
    }

    /// Newline-delimited bulk payload indexing `items`
    fn bulk_body(items: &[&ProductItem]) -> AppResult<String> {
        let mut body = String::new();
        for item in items {
            let action = json!({ "index": { "_id": item.item_id } });
            for line in [action, Self::document(item)] {
                let encoded = serde_json::to_string(&line)
                    .map_err(|e| AppError::Internal(format!("Bulk serialization error: {}", e)))?;
                body.push_str(&encoded);
                body.push('\n');
            }
        }
        Ok(body)
    }

    /// Maps transport failures to an unavailable backend
    fn unavailable(e: reqwest::Error) -> AppError {
        AppError::CatalogUnavailable(format!("Elasticsearch request failed: {}", e))
    }

    /// Fails with a typed error for non-success responses
    async fn check_status(response: Response, operation: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            operation = %operation,
            status = %status,
            body = %body,
            "Elasticsearch request failed"
        );

        if status.is_server_error() || status == StatusCode::NOT_FOUND {
            Err(AppError::CatalogUnavailable(format!(
                "Elasticsearch {} returned status {}",
                operation, status
            )))
        } else {
            Err(AppError::Internal(format!(
                "Elasticsearch {} returned status {}: {}",
                operation, status, body
            )))
        }
    }

    async fn delete_index(&self, index: &str) -> AppResult<()> {
        let response = self
            .http_client
            .delete(format!("{}/{}", self.base_url, index))
            .send()
            .await
            .map_err(Self::unavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(response, "delete index").await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogGateway for ElasticsearchGateway {
    async fn search(
        &self,
        catalog: &CatalogSnapshot,
        query: &CandidateQuery,
    ) -> AppResult<HashSet<ItemId>> {
        if query.lifestyle_tags.is_empty() || query.limit == 0 {
            return Ok(HashSet::new());
        }

        let index = self.index_name(catalog.version());
        let response = self
            .http_client
            .post(format!("{}/{}/_search", self.base_url, index))
            .json(&Self::search_body(query))
            .send()
            .await
            .map_err(Self::unavailable)?;

        let response = Self::check_status(response, "search").await?;
        let results: SearchResponse = response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse Elasticsearch response: {}", e))
        })?;

        let ids: HashSet<ItemId> = results.hits.hits.into_iter().map(|hit| hit.id).collect();

        tracing::debug!(
            index = %index,
            body_type = %query.body_type,
            hits = ids.len(),
            "Elasticsearch candidate search completed"
        );

        Ok(ids)
    }

    async fn reindex(&self, catalog: &CatalogSnapshot) -> AppResult<()> {
        let index = self.index_name(catalog.version());

        // A retried import may find a half-built index for this version
        self.delete_index(&index).await?;

        let response = self
            .http_client
            .put(format!("{}/{}", self.base_url, index))
            .json(&Self::index_definition())
            .send()
            .await
            .map_err(Self::unavailable)?;
        Self::check_status(response, "create index").await?;

        let items: Vec<&ProductItem> = catalog.items().collect();
        for chunk in items.chunks(BULK_CHUNK_SIZE) {
            let response = self
                .http_client
                .post(format!("{}/{}/_bulk?refresh=true", self.base_url, index))
                .header("Content-Type", "application/x-ndjson")
                .body(Self::bulk_body(chunk)?)
                .send()
                .await
                .map_err(Self::unavailable)?;

            let response = Self::check_status(response, "bulk index").await?;
            let result: BulkResponse = response.json().await.map_err(|e| {
                AppError::Internal(format!("Failed to parse bulk response: {}", e))
            })?;
            if result.errors {
                return Err(AppError::Internal(format!(
                    "Elasticsearch rejected documents while indexing {}",
                    index
                )));
            }
        }

        tracing::info!(index = %index, documents = items.len(), "Catalog indexed");

        Ok(())
    }

    async fn ensure_indexed(&self, catalog: &CatalogSnapshot) -> AppResult<()> {
        let index = self.index_name(catalog.version());
        let response = self
            .http_client
            .head(format!("{}/{}", self.base_url, index))
            .send()
            .await
            .map_err(Self::unavailable)?;

        // Activated versions were fully indexed before activation
        if response.status() == StatusCode::NOT_FOUND {
            return self.reindex(catalog).await;
        }
        Self::check_status(response, "check index").await?;

        tracing::debug!(index = %index, "Catalog index already present");
        Ok(())
    }

    async fn prune(&self, keep: &[i64]) -> AppResult<()> {
        let response = self
            .http_client
            .get(format!(
                "{}/_cat/indices/{}-v*?format=json&h=index",
                self.base_url, self.index_prefix
            ))
            .send()
            .await
            .map_err(Self::unavailable)?;

        let response = Self::check_status(response, "list indices").await?;
        let indices: Vec<CatIndex> = response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse index listing: {}", e))
        })?;

        let stale = self.stale_indices(indices.into_iter().map(|i| i.index).collect(), keep);
        for index in &stale {
            self.delete_index(index).await?;
        }

        if !stale.is_empty() {
            tracing::info!(dropped = ?stale, kept = ?keep, "Stale catalog indices dropped");
        }
        Ok(())
    }

    fn precision(&self) -> MatchPrecision {
        MatchPrecision::Exact
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }
}
