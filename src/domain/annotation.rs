//! User-owned annotation state: favorites, personal ratings, and reviews
//!
//! These entities are written only by UI-side actions. The ingestion pipeline
//! reads none of them and must never write them; a re-crawl of a game leaves
//! its annotation row exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-game user state, one row per external id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnnotation {
    pub external_id: i64,
    pub is_favorite: bool,
    /// Latest personal rating on the 1..=10 scale.
    pub personal_rating: Option<i64>,
    pub personal_review: Option<String>,
    pub review_timestamp: Option<DateTime<Utc>>,
}

/// One entry in the append-only review log. A game can accumulate several;
/// the annotation row mirrors the most recent one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub external_id: i64,
    pub rating: i64,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}
