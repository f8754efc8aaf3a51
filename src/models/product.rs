use serde::{Deserialize, Serialize};

use super::TagSet;

/// Utility token that marks a statement piece
pub const STATEMENT_UTILITY: &str = "Statement";

/// Catalog item identifier as published by the feed
pub type ItemId = String;

/// Immutable catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub image_url: String,
    pub category: String,
    pub color_name: String,
    pub color_family: String,
    pub is_neutral: bool,
    pub season: String,
    pub fit: String,
    pub style: TagSet,
    pub body_type: TagSet,
    pub lifestyle: TagSet,
    pub utility: TagSet,
}

impl ProductItem {
    /// Whether the item belongs to the statement utility class
    pub fn is_statement(&self) -> bool {
        self.utility.contains(STATEMENT_UTILITY)
    }
}

/// Public projection of a product; the only shape ever returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub item_id: ItemId,
    pub item_name: String,
    pub image_url: String,
    pub category: String,
}

impl From<&ProductItem> for ProductView {
    fn from(item: &ProductItem) -> Self {
        Self {
            item_id: item.item_id.clone(),
            item_name: item.item_name.clone(),
            image_url: item.image_url.clone(),
            category: item.category.clone(),
        }
    }
}

impl From<ProductItem> for ProductView {
    fn from(item: ProductItem) -> Self {
        Self {
            item_id: item.item_id,
            item_name: item.item_name,
            image_url: item.image_url,
            category: item.category,
        }
    }
}

// ============================================================================
// Catalog Feed Types
// ============================================================================

/// One row of the catalog feed, keyed by the feed's column headers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFeedRow {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "Item Name", default)]
    pub item_name: Option<String>,
    #[serde(rename = "Image", default)]
    pub image: Option<String>,
    #[serde(rename = "Category", default)]
    pub category: Option<String>,
    #[serde(rename = "Colour Name", default)]
    pub color_name: Option<String>,
    #[serde(rename = "Colour Family", default)]
    pub color_family: Option<String>,
    #[serde(rename = "Colour_is_neutral", default)]
    pub is_neutral: Option<String>,
    #[serde(rename = "Season", default)]
    pub season: Option<String>,
    #[serde(rename = "Fit", default)]
    pub fit: Option<String>,
    #[serde(rename = "Style", default)]
    pub style: Option<String>,
    #[serde(rename = "BodyType", default)]
    pub body_type: Option<String>,
    #[serde(rename = "Lifestyle", default)]
    pub lifestyle: Option<String>,
    #[serde(rename = "Utility", default)]
    pub utility: Option<String>,
}

impl CatalogFeedRow {
    /// Converts the row into a catalog record; rows without an ID yield `None`
    pub fn into_item(self) -> Option<ProductItem> {
        let item_id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())?;

        let text = |value: Option<String>| value.map(|v| v.trim().to_string()).unwrap_or_default();
        let tags = |value: Option<String>| TagSet::parse(value.as_deref().unwrap_or_default());

        Some(ProductItem {
            item_id,
            item_name: text(self.item_name),
            image_url: parse_image_url(self.image.as_deref().unwrap_or_default()),
            category: text(self.category),
            color_name: text(self.color_name),
            color_family: text(self.color_family),
            is_neutral: self
                .is_neutral
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            season: text(self.season),
            fit: text(self.fit),
            style: tags(self.style),
            body_type: tags(self.body_type),
            lifestyle: tags(self.lifestyle),
            utility: tags(self.utility),
        })
    }
}

/// Extracts the URL from a feed image cell like `"front.jpg (https://cdn/x.jpg)"`
///
/// Cells without parentheses carry no usable URL.
pub fn parse_image_url(cell: &str) -> String {
    match cell.rsplit_once('(') {
        Some((_, rest)) => rest.replace(')', "").trim().to_string(),
        None => String::new(),
    }
}
