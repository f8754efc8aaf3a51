use serde::Serialize;
use std::collections::HashMap;

use crate::{
    db::CatalogRepository,
    error::{AppError, AppResult},
    models::{CatalogFeedRow, ItemId, ProductItem},
    services::{
        catalog::{CatalogSnapshot, SharedCatalog},
        gateway::CatalogGateway,
    },
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Outcome of a catalog import
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportSummary {
    pub version: i64,
    pub imported: usize,
    /// Rows dropped for lacking an ID
    pub skipped: usize,
}

/// Replaces the whole catalog with the feed
///
/// 1. Stage the items under a new version (not yet visible to readers)
/// 2. Index the version in the search backend
/// 3. Activate it in storage, then swap the in-memory snapshot
/// 4. Drop search state older than the replaced live version
///
/// A failed step leaves the live catalog untouched and discards the staged
/// version. Imports in one process run one at a time.
pub async fn import_catalog(
    repository: &dyn CatalogRepository,
    gateway: &dyn CatalogGateway,
    catalog: &SharedCatalog,
    rows: Vec<CatalogFeedRow>,
) -> AppResult<ImportSummary> {
    let (items, skipped) = parse_feed(rows);
    let imported = items.len();

    let _updates = catalog.lock_updates().await;

    let version = repository.stage(&items).await?;
    let snapshot = CatalogSnapshot::new(version, items);

    if let Err(e) = gateway.reindex(&snapshot).await {
        discard(repository, version).await;
        return Err(e);
    }
    if let Err(e) = repository.activate(version).await {
        discard(repository, version).await;
        return Err(e);
    }

    let live = catalog.current().version();
    let replaced = catalog.swap(snapshot).map_or(live, |previous| previous.version());

    if let Err(e) = gateway.prune(&[version, replaced]).await {
        tracing::warn!(version, error = %e, "Failed to drop stale search state");
    }

    tracing::info!(version, imported, skipped, "Catalog imported");

    Ok(ImportSummary {
        version,
        imported,
        skipped,
    })
}

async fn discard(repository: &dyn CatalogRepository, version: i64) {
    if let Err(e) = repository.discard(version).await {
        tracing::warn!(version, error = %e, "Failed to discard staged catalog version");
    }
}

/// Swaps in the latest activated catalog when it is newer than the live one
///
/// Runs at startup and periodically, so catalogs imported by another process
/// or the `import` command reach this one. Returns whether a newer version was
/// loaded.
pub async fn load_catalog(
    repository: &dyn CatalogRepository,
    gateway: &dyn CatalogGateway,
    catalog: &SharedCatalog,
) -> AppResult<bool> {
    let _updates = catalog.lock_updates().await;

    let live = catalog.current().version();
    if repository.active_version().await? <= live {
        return Ok(false);
    }

    let (version, items) = repository.load_latest().await?;
    let snapshot = CatalogSnapshot::new(version, items);

    gateway.ensure_indexed(&snapshot).await?;
    let loaded = catalog.swap(snapshot).is_some();

    tracing::info!(version, live_version = live, loaded, "Catalog reloaded from storage");

    Ok(loaded)
}

/// Reads a catalog CSV export, tolerating a leading UTF-8 byte order mark
pub fn read_feed_csv(data: &[u8]) -> AppResult<Vec<CatalogFeedRow>> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    reader
        .deserialize()
        .collect::<Result<Vec<CatalogFeedRow>, _>>()
        .map_err(|e| AppError::InvalidInput(format!("Malformed catalog CSV: {}", e)))
}

/// Converts feed rows, skipping rows without an ID; a later duplicate ID wins
fn parse_feed(rows: Vec<CatalogFeedRow>) -> (Vec<ProductItem>, usize) {
    let mut positions: HashMap<ItemId, usize> = HashMap::new();
    let mut items: Vec<ProductItem> = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        let Some(item) = row.into_item() else {
            skipped += 1;
            continue;
        };
        match positions.get(&item.item_id) {
            Some(&index) => items[index] = item,
            None => {
                positions.insert(item.item_id.clone(), items.len());
                items.push(item);
            }
        }
    }

    (items, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCatalogRepository;
    use crate::models::ItemId;
    use crate::services::catalog::test_support::item;
    use crate::services::gateway::{
        CandidateQuery, MatchPrecision, MockCatalogGateway, TagIndexGateway,
    };
    use std::collections::HashSet;
    use std::time::Duration;

    fn row(id: Option<&str>, name: &str) -> CatalogFeedRow {
        CatalogFeedRow {
            id: id.map(str::to_string),
            item_name: Some(name.to_string()),
            body_type: Some("Pear".to_string()),
            lifestyle: Some("Social".to_string()),
            utility: Some("Basic".to_string()),
            ..Default::default()
        }
    }

    /// Indexes version 1 slowly, so a later import can overtake it
    struct SlowFirstVersion;

    #[async_trait::async_trait]
    impl CatalogGateway for SlowFirstVersion {
        async fn search(
            &self,
            _catalog: &CatalogSnapshot,
            _query: &CandidateQuery,
        ) -> AppResult<HashSet<ItemId>> {
            Ok(HashSet::new())
        }

        async fn reindex(&self, catalog: &CatalogSnapshot) -> AppResult<()> {
            if catalog.version() == 1 {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(())
        }

        fn precision(&self) -> MatchPrecision {
            MatchPrecision::Exact
        }

        fn name(&self) -> &'static str {
            "slow_first_version"
        }
    }

    #[test]
    fn test_parse_feed_skips_rows_without_id() {
        let (items, skipped) = parse_feed(vec![row(Some("A1"), "One"), row(None, "Blank"), row(Some(""), "Empty")]);
        assert_eq!(items.len(), 1);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_parse_feed_last_duplicate_wins() {
        let (items, skipped) = parse_feed(vec![row(Some("A1"), "First"), row(Some("A2"), "Other"), row(Some("A1"), "Second")]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_name, "Second");
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_read_feed_csv_with_byte_order_mark() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(
            b"ID,Item Name,Image,Category,Colour_is_neutral,Style,BodyType,Lifestyle,Utility\n\
              A1,Wrap Dress,Front(https://cdn.example.com/a1.jpg),Dresses,True,Romantic,\"Pear,Hourglass\",Social,Statement\n\
              ,Orphan,,Tops,false,Classic,Pear,Social,Basic\n",
        );

        let rows = read_feed_csv(&data).unwrap();
        assert_eq!(rows.len(), 2);

        let (items, skipped) = parse_feed(rows);
        assert_eq!(skipped, 1);
        let dress = &items[0];
        assert_eq!(dress.item_id, "A1");
        assert_eq!(dress.image_url, "https://cdn.example.com/a1.jpg");
        assert!(dress.is_neutral);
        assert!(dress.body_type.contains("hourglass"));
        assert!(dress.is_statement());
    }

    #[test]
    fn test_read_feed_csv_tolerates_short_rows() {
        let rows = read_feed_csv(b"ID,Item Name,Style\nA1,Tee\n").unwrap();
        assert_eq!(rows[0].id.as_deref(), Some("A1"));
        assert_eq!(rows[0].style, None);
    }

    #[tokio::test]
    async fn test_import_swaps_snapshot() {
        let repository = MemoryCatalogRepository::new();
        let catalog = SharedCatalog::default();

        let summary = import_catalog(
            &repository,
            &TagIndexGateway::new(),
            &catalog,
            vec![row(Some("A1"), "One"), row(Some("A2"), "Two")],
        )
        .await
        .unwrap();

        assert_eq!(summary, ImportSummary { version: 1, imported: 2, skipped: 0 });
        assert_eq!(catalog.current().version(), 1);
        assert!(catalog.current().get("A2").is_some());
        assert_eq!(repository.active_version().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_import_replaces_previous_catalog() {
        let repository = MemoryCatalogRepository::new();
        let catalog = SharedCatalog::default();
        let gateway = TagIndexGateway::new();

        import_catalog(&repository, &gateway, &catalog, vec![row(Some("A1"), "One")])
            .await
            .unwrap();
        import_catalog(&repository, &gateway, &catalog, vec![row(Some("B1"), "New")])
            .await
            .unwrap();

        let snapshot = catalog.current();
        assert_eq!(snapshot.version(), 2);
        assert!(snapshot.get("A1").is_none());
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_imports_keep_newest_catalog_live() {
        let repository = MemoryCatalogRepository::new();
        let catalog = SharedCatalog::default();
        let gateway = SlowFirstVersion;

        let (first, second) = tokio::join!(
            import_catalog(&repository, &gateway, &catalog, vec![row(Some("OLD"), "Old")]),
            import_catalog(&repository, &gateway, &catalog, vec![row(Some("NEW"), "New")]),
        );
        let versions = [first.unwrap().version, second.unwrap().version];
        assert!(versions.contains(&1) && versions.contains(&2));

        let (stored_version, stored) = repository.load_latest().await.unwrap();
        let live = catalog.current();
        assert_eq!(stored_version, 2);
        assert_eq!(live.version(), stored_version);
        assert_eq!(live.len(), 1);
        assert!(live.get(&stored[0].item_id).is_some());
    }

    #[tokio::test]
    async fn test_failed_reindex_keeps_storage_and_snapshot_in_step() {
        let repository = MemoryCatalogRepository::new();
        let catalog = SharedCatalog::default();
        import_catalog(&repository, &TagIndexGateway::new(), &catalog, vec![row(Some("A1"), "One")])
            .await
            .unwrap();

        let mut gateway = MockCatalogGateway::new();
        gateway
            .expect_reindex()
            .returning(|_| Err(AppError::CatalogUnavailable("index down".to_string())));
        gateway.expect_prune().never();

        let result = import_catalog(&repository, &gateway, &catalog, vec![row(Some("B1"), "New")]).await;
        assert!(matches!(result, Err(AppError::CatalogUnavailable(_))));

        // A restart would load exactly what is live now
        let (stored_version, stored) = repository.load_latest().await.unwrap();
        assert_eq!(stored_version, 1);
        assert_eq!(stored[0].item_id, "A1");
        assert_eq!(catalog.current().version(), 1);

        let reloaded = SharedCatalog::default();
        load_catalog(&repository, &TagIndexGateway::new(), &reloaded)
            .await
            .unwrap();
        assert!(reloaded.current().get("B1").is_none());
    }

    #[tokio::test]
    async fn test_prune_keeps_new_and_replaced_versions() {
        let repository = MemoryCatalogRepository::new();
        let catalog = SharedCatalog::default();
        import_catalog(&repository, &TagIndexGateway::new(), &catalog, vec![row(Some("A1"), "One")])
            .await
            .unwrap();

        // Version 2 fails, so version 3 replaces the live version 1
        let mut failing = MockCatalogGateway::new();
        failing
            .expect_reindex()
            .returning(|_| Err(AppError::CatalogUnavailable("index down".to_string())));
        let _ = import_catalog(&repository, &failing, &catalog, vec![row(Some("B1"), "Two")]).await;

        let mut gateway = MockCatalogGateway::new();
        gateway.expect_reindex().returning(|_| Ok(()));
        gateway
            .expect_prune()
            .withf(|keep| keep.to_vec() == vec![3, 1])
            .times(1)
            .returning(|_| Ok(()));

        let summary = import_catalog(&repository, &gateway, &catalog, vec![row(Some("C1"), "Three")])
            .await
            .unwrap();
        assert_eq!(summary.version, 3);
    }

    #[tokio::test]
    async fn test_failed_prune_does_not_fail_import() {
        let repository = MemoryCatalogRepository::new();
        let catalog = SharedCatalog::default();

        let mut gateway = MockCatalogGateway::new();
        gateway.expect_reindex().returning(|_| Ok(()));
        gateway
            .expect_prune()
            .returning(|_| Err(AppError::CatalogUnavailable("index down".to_string())));

        let summary = import_catalog(&repository, &gateway, &catalog, vec![row(Some("A1"), "One")])
            .await
            .unwrap();
        assert_eq!(summary.version, 1);
        assert_eq!(catalog.current().version(), 1);
    }

    #[tokio::test]
    async fn test_load_catalog_only_when_newer() {
        let repository = MemoryCatalogRepository::new();
        let version = repository
            .stage(&[item("A1", "Pear", "Social", "Classic", "Basic")])
            .await
            .unwrap();
        repository.activate(version).await.unwrap();
        let catalog = SharedCatalog::default();
        let gateway = TagIndexGateway::new();

        assert!(load_catalog(&repository, &gateway, &catalog).await.unwrap());
        assert_eq!(catalog.current().version(), 1);
        assert_eq!(catalog.current().len(), 1);

        assert!(!load_catalog(&repository, &gateway, &catalog).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_catalog_ignores_staged_versions() {
        let repository = MemoryCatalogRepository::new();
        repository
            .stage(&[item("A1", "Pear", "Social", "Classic", "Basic")])
            .await
            .unwrap();
        let catalog = SharedCatalog::default();

        let loaded = load_catalog(&repository, &TagIndexGateway::new(), &catalog)
            .await
            .unwrap();

        assert!(!loaded);
        assert!(catalog.current().is_empty());
    }
}
