use chrono::Utc;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    db::{AccountStore, ProfileStore},
    error::{AppError, AppResult},
    models::{rank_top_styles, TagSet, UserPreferenceProfile, STATEMENT_CATEGORY, TOP_STYLE_COUNT},
};

/// Score added to the first style of a selected pair
const PRIMARY_STYLE_WEIGHT: f64 = 1.0;
/// Score added to the second style of a selected pair
const SECONDARY_STYLE_WEIGHT: f64 = 0.5;

/// Fixed wardrobe targets until the quiz asks about them
const WORKWEAR_SHARE: f64 = 0.7;
const DRESSES_SHARE: f64 = 0.5;
const STATEMENT_SHARE: f64 = 0.3;

/// Answers from one quiz submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizSubmission {
    #[serde(default)]
    pub primary_body_type: Option<String>,
    #[serde(default)]
    pub secondary_body_type: Option<String>,
    #[serde(default)]
    pub weekday_lifestyle: Option<String>,
    #[serde(default)]
    pub weekend_lifestyle: Vec<String>,
    /// How much of the year is cold: `"always"`, `"3-months"`, ...
    #[serde(default)]
    pub seasonality_answer: Option<String>,
    /// One `[primary, secondary]` style pair per style question
    #[serde(default)]
    pub style_selections: Vec<Vec<String>>,
}

/// Turns quiz answers into a complete preference profile
///
/// The result replaces the stored profile wholesale; nothing from a previous
/// submission is merged in.
pub fn build_profile(user_id: Uuid, submission: QuizSubmission) -> AppResult<UserPreferenceProfile> {
    let primary_body_type = non_blank(submission.primary_body_type).ok_or_else(|| {
        AppError::InvalidInput("primary_body_type is required".to_string())
    })?;

    let style_scores = style_scores(&submission.style_selections);
    let top_styles = rank_top_styles(&style_scores, TOP_STYLE_COUNT);

    Ok(UserPreferenceProfile {
        user_id,
        primary_body_type: Some(primary_body_type),
        secondary_body_type: non_blank(submission.secondary_body_type),
        weekday_lifestyle: non_blank(submission.weekday_lifestyle),
        weekend_lifestyle: TagSet::from_tokens(&submission.weekend_lifestyle),
        wardrobe_percentages: wardrobe_percentages(submission.seasonality_answer.as_deref()),
        style_scores,
        top_styles,
        updated_at: Utc::now(),
    })
}

/// Records a quiz submission for an existing account
pub async fn submit_quiz(
    accounts: &dyn AccountStore,
    profiles: &dyn ProfileStore,
    user_id: Uuid,
    submission: QuizSubmission,
) -> AppResult<UserPreferenceProfile> {
    if !accounts.exists(user_id).await? {
        return Err(AppError::NotFound(format!("No account with id {}", user_id)));
    }

    let profile = build_profile(user_id, submission)?;
    profiles.save(&profile).await?;

    tracing::info!(
        user_id = %user_id,
        body_type = profile.primary_body_type.as_deref().unwrap_or_default(),
        top_styles = ?profile.top_styles,
        "Profile updated from quiz"
    );

    Ok(profile)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Wardrobe category targets derived from the answers
fn wardrobe_percentages(seasonality: Option<&str>) -> HashMap<String, f64> {
    let mut percentages = HashMap::new();

    match seasonality.map(str::trim) {
        Some("always") => {
            percentages.insert("winter_wear".to_string(), 0.75);
        }
        Some("3-months") => {
            percentages.insert("winter_wear".to_string(), 0.5);
        }
        _ => {}
    }

    percentages.insert("workwear".to_string(), WORKWEAR_SHARE);
    percentages.insert("dresses".to_string(), DRESSES_SHARE);
    percentages.insert(STATEMENT_CATEGORY.to_string(), STATEMENT_SHARE);

    percentages
}

/// Accumulates style affinity from `[primary, secondary]` pairs
///
/// Pairs that do not have exactly two entries are ignored; blank entries score nothing.
fn style_scores(selections: &[Vec<String>]) -> IndexMap<String, f64> {
    let mut scores: IndexMap<String, f64> = IndexMap::new();

    for selection in selections {
        let [primary, secondary] = selection.as_slice() else {
            continue;
        };
        for (style, weight) in [
            (primary, PRIMARY_STYLE_WEIGHT),
            (secondary, SECONDARY_STYLE_WEIGHT),
        ] {
            let style = style.trim();
            if !style.is_empty() {
                *scores.entry(style.to_string()).or_insert(0.0) += weight;
            }
        }
    }

    scores
}
