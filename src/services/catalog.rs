use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, MutexGuard};

use crate::models::{tag_key, ItemId, ProductItem, TagSet};

/// Immutable, versioned copy of the catalog with its structured tag index
///
/// A recommendation pins one snapshot for its whole run, so an import that
/// swaps in a newer version never mixes old and new records mid-computation.
#[derive(Debug)]
pub struct CatalogSnapshot {
    version: i64,
    loaded_at: DateTime<Utc>,
    items: HashMap<ItemId, ProductItem>,
    /// Normalized body type token → items
    body_type_index: HashMap<String, HashSet<ItemId>>,
    /// Normalized lifestyle token → items
    lifestyle_index: HashMap<String, HashSet<ItemId>>,
}

impl CatalogSnapshot {
    /// Builds a snapshot; later duplicates of an item ID replace earlier ones
    pub fn new(version: i64, items: Vec<ProductItem>) -> Self {
        let items: HashMap<ItemId, ProductItem> = items
            .into_iter()
            .map(|item| (item.item_id.clone(), item))
            .collect();

        let mut body_type_index: HashMap<String, HashSet<ItemId>> = HashMap::new();
        let mut lifestyle_index: HashMap<String, HashSet<ItemId>> = HashMap::new();

        for item in items.values() {
            for key in item.body_type.keys() {
                body_type_index
                    .entry(key.to_string())
                    .or_default()
                    .insert(item.item_id.clone());
            }
            for key in item.lifestyle.keys() {
                lifestyle_index
                    .entry(key.to_string())
                    .or_default()
                    .insert(item.item_id.clone());
            }
        }

        Self {
            version,
            loaded_at: Utc::now(),
            items,
            body_type_index,
            lifestyle_index,
        }
    }

    /// Snapshot of an empty catalog
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&ProductItem> {
        self.items.get(item_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ProductItem> {
        self.items.values()
    }

    /// Items whose body type tokens include `body_type`
    pub fn with_body_type(&self, body_type: &str) -> Option<&HashSet<ItemId>> {
        self.body_type_index.get(&tag_key(body_type))
    }

    /// Items whose lifestyle tokens intersect `tags`
    pub fn with_any_lifestyle(&self, tags: &TagSet) -> HashSet<&ItemId> {
        tags.keys()
            .filter_map(|key| self.lifestyle_index.get(key))
            .flatten()
            .collect()
    }

    /// Hydrates identifiers into full records
    ///
    /// Identifiers missing from this snapshot are dropped; the search index and the
    /// catalog are only eventually consistent.
    pub fn resolve(&self, ids: &HashSet<ItemId>) -> Vec<ProductItem> {
        let mut missing = 0usize;
        let items: Vec<ProductItem> = ids
            .iter()
            .filter_map(|id| {
                let item = self.items.get(id).cloned();
                if item.is_none() {
                    missing += 1;
                }
                item
            })
            .collect();

        if missing > 0 {
            tracing::debug!(
                catalog_version = self.version,
                missing,
                "Dropped identifiers with no catalog record"
            );
        }

        items
    }
}

/// Process-wide handle to the current catalog snapshot
#[derive(Clone)]
pub struct SharedCatalog {
    current: Arc<RwLock<Arc<CatalogSnapshot>>>,
    /// Serializes imports and reloads within the process
    updates: Arc<Mutex<()>>,
}

impl Default for SharedCatalog {
    fn default() -> Self {
        Self::new(CatalogSnapshot::empty())
    }
}

impl SharedCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
            updates: Arc::new(Mutex::new(())),
        }
    }

    /// Pins the current snapshot
    pub fn current(&self) -> Arc<CatalogSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Waits until no other import or reload is running
    pub async fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.updates.lock().await
    }

    /// Atomically replaces the snapshot unless it is older than the live one
    ///
    /// Returns the replaced snapshot, or `None` when `snapshot` was stale and
    /// dropped. Readers holding the old snapshot keep it.
    pub fn swap(&self, snapshot: CatalogSnapshot) -> Option<Arc<CatalogSnapshot>> {
        let next = Arc::new(snapshot);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if next.version() < guard.version() {
            tracing::warn!(
                live_version = guard.version(),
                version = next.version(),
                "Ignored catalog snapshot older than the live one"
            );
            return None;
        }

        let previous = std::mem::replace(&mut *guard, Arc::clone(&next));

        tracing::info!(
            previous_version = previous.version(),
            version = next.version(),
            items = next.len(),
            "Catalog snapshot swapped"
        );

        Some(previous)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{ProductItem, TagSet};

    /// Builds a catalog item with the tag attributes the pipeline looks at
    pub fn item(id: &str, body_type: &str, lifestyle: &str, style: &str, utility: &str) -> ProductItem {
        ProductItem {
            item_id: id.to_string(),
            item_name: format!("Item {}", id),
            image_url: format!("https://cdn.example.com/{}.jpg", id),
            category: "Tops".to_string(),
            color_name: "Ivory".to_string(),
            color_family: "White".to_string(),
            is_neutral: true,
            season: "All".to_string(),
            fit: "Regular".to_string(),
            style: TagSet::parse(style),
            body_type: TagSet::parse(body_type),
            lifestyle: TagSet::parse(lifestyle),
            utility: TagSet::parse(utility),
        }
    }
}
