use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::TagSet;

/// Wardrobe category that drives the statement/basic split
pub const STATEMENT_CATEGORY: &str = "statement";

/// Number of ranked styles kept on a profile
pub const TOP_STYLE_COUNT: usize = 3;

/// Quiz-derived preferences for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferenceProfile {
    pub user_id: Uuid,
    pub primary_body_type: Option<String>,
    pub secondary_body_type: Option<String>,
    pub weekday_lifestyle: Option<String>,
    pub weekend_lifestyle: TagSet,
    /// Target fraction per wardrobe category, expected in [0, 1]
    pub wardrobe_percentages: HashMap<String, f64>,
    /// Accumulated affinity per style, in accumulation order
    pub style_scores: IndexMap<String, f64>,
    /// Highest scoring styles, best first
    pub top_styles: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferenceProfile {
    /// Creates the empty profile materialized alongside a new account
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            primary_body_type: None,
            secondary_body_type: None,
            weekday_lifestyle: None,
            weekend_lifestyle: TagSet::default(),
            wardrobe_percentages: HashMap::new(),
            style_scores: IndexMap::new(),
            top_styles: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// A profile is usable for recommendations once the quiz recorded a body type
    pub fn is_complete(&self) -> bool {
        self.primary_body_type
            .as_deref()
            .is_some_and(|body_type| !body_type.trim().is_empty())
    }

    /// Weekday lifestyle plus every weekend lifestyle tag
    pub fn lifestyle_tags(&self) -> TagSet {
        let mut tags = self.weekend_lifestyle.clone();
        if let Some(weekday) = &self.weekday_lifestyle {
            tags.insert(weekday);
        }
        tags
    }

    /// Ranked styles as a tag set for matching
    pub fn top_style_tags(&self) -> TagSet {
        TagSet::from_tokens(&self.top_styles)
    }

    /// Target statement fraction, sanitized into [0, 1]
    ///
    /// Missing ratios fall back to `default`. Non-finite or out-of-range values are
    /// clamped and logged rather than rejected.
    pub fn statement_ratio(&self, default: f64) -> f64 {
        match self.wardrobe_percentages.get(STATEMENT_CATEGORY) {
            None => default,
            Some(ratio) if ratio.is_nan() => {
                tracing::warn!(
                    user_id = %self.user_id,
                    "Malformed profile data: statement ratio is NaN, using default"
                );
                default
            }
            Some(ratio) if !(0.0..=1.0).contains(ratio) => {
                let clamped = ratio.clamp(0.0, 1.0);
                tracing::warn!(
                    user_id = %self.user_id,
                    ratio = *ratio,
                    clamped,
                    "Malformed profile data: statement ratio outside [0, 1]"
                );
                clamped
            }
            Some(ratio) => *ratio,
        }
    }
}

/// Reads a stored `{name: number}` object, dropping entries that are not numbers
///
/// Stored JSON is not trusted: a non-object or a non-numeric entry is logged as
/// malformed profile data and skipped instead of failing the request.
pub fn scores_from_json(user_id: Uuid, field: &str, value: &serde_json::Value) -> IndexMap<String, f64> {
    let Some(entries) = value.as_object() else {
        if !value.is_null() {
            tracing::warn!(
                user_id = %user_id,
                field,
                "Malformed profile data: expected a JSON object"
            );
        }
        return IndexMap::new();
    };

    entries
        .iter()
        .filter_map(|(name, score)| match score.as_f64() {
            Some(score) => Some((name.clone(), score)),
            None => {
                tracing::warn!(
                    user_id = %user_id,
                    field,
                    key = %name,
                    "Malformed profile data: non-numeric value dropped"
                );
                None
            }
        })
        .collect()
}

/// Ranks styles by score, best first, keeping accumulation order for ties
pub fn rank_top_styles(scores: &IndexMap<String, f64>, count: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, f64)> = scores.iter().map(|(style, score)| (style, *score)).collect();
    // Stable sort keeps first-accumulated styles ahead on equal scores
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(count)
        .map(|(style, _)| style.clone())
        .collect()
}
