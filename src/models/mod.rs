mod account;
mod product;
mod profile;
mod tags;

pub use account::{normalize_email, Account, NewAccount};
pub use product::{
    parse_image_url, CatalogFeedRow, ItemId, ProductItem, ProductView, STATEMENT_UTILITY,
};
pub use profile::{
    rank_top_styles, scores_from_json, UserPreferenceProfile, STATEMENT_CATEGORY, TOP_STYLE_COUNT,
};
pub use tags::{tag_key, TagSet, TAG_DELIMITER};
