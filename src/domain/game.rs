//! Catalog game records and the field-wise reconciliation policy
//!
//! A `GameRecord` is whatever one crawl of a detail payload could extract;
//! any field except the identity and primary name may be absent. Re-crawls
//! refine records through `merge_missing`, which only ever fills gaps.

use serde::{Deserialize, Serialize};

/// One external catalog entry, keyed by the remote database's numeric id.
///
/// Row timestamps are managed by the storage layer; keeping them out of the
/// domain struct lets `PartialEq` express "same stored state".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub external_id: i64,
    pub primary_name: String,
    pub localized_name: Option<String>,
    pub image_url: Option<String>,
    pub player_count_min: Option<i64>,
    pub player_count_max: Option<i64>,
    /// Free-text set descriptor, e.g. "2, 4".
    pub players_best: Option<String>,
    pub players_recommended: Option<String>,
    pub play_time_min: Option<i64>,
    pub play_time_max: Option<i64>,
    pub minimum_age: Option<i64>,
    pub complexity_weight: Option<f64>,
    pub community_rating: Option<f64>,
    /// Comma-joined tag lists, one per tag kind.
    pub type_tags: Option<String>,
    pub category_tags: Option<String>,
    pub mechanism_tags: Option<String>,
    pub detail_url: Option<String>,
}

impl GameRecord {
    /// Merge a freshly crawled record over the stored one.
    ///
    /// Every field keeps the stored value unless it is null/empty and the
    /// incoming value is non-null/non-empty. Empty strings count as empty, so
    /// a populated field is never regressed by a thinner re-crawl.
    pub fn merge_missing(existing: &GameRecord, incoming: &GameRecord) -> GameRecord {
        GameRecord {
            external_id: existing.external_id,
            primary_name: if existing.primary_name.trim().is_empty()
                && !incoming.primary_name.trim().is_empty()
            {
                incoming.primary_name.clone()
            } else {
                existing.primary_name.clone()
            },
            localized_name: fill_text(&existing.localized_name, &incoming.localized_name),
            image_url: fill_text(&existing.image_url, &incoming.image_url),
            player_count_min: existing.player_count_min.or(incoming.player_count_min),
            player_count_max: existing.player_count_max.or(incoming.player_count_max),
            players_best: fill_text(&existing.players_best, &incoming.players_best),
            players_recommended: fill_text(
                &existing.players_recommended,
                &incoming.players_recommended,
            ),
            play_time_min: existing.play_time_min.or(incoming.play_time_min),
            play_time_max: existing.play_time_max.or(incoming.play_time_max),
            minimum_age: existing.minimum_age.or(incoming.minimum_age),
            complexity_weight: existing.complexity_weight.or(incoming.complexity_weight),
            community_rating: existing.community_rating.or(incoming.community_rating),
            type_tags: fill_text(&existing.type_tags, &incoming.type_tags),
            category_tags: fill_text(&existing.category_tags, &incoming.category_tags),
            mechanism_tags: fill_text(&existing.mechanism_tags, &incoming.mechanism_tags),
            detail_url: fill_text(&existing.detail_url, &incoming.detail_url),
        }
    }
}

/// Keep the existing text unless it is absent or blank.
fn fill_text(existing: &Option<String>, incoming: &Option<String>) -> Option<String> {
    match existing {
        Some(text) if !text.trim().is_empty() => existing.clone(),
        _ => match incoming {
            Some(text) if !text.trim().is_empty() => incoming.clone(),
            _ => existing.clone(),
        },
    }
}

/// Outcome of an upsert, mostly useful for run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Merged,
    /// The merge produced no field changes; the row was left untouched.
    Unchanged,
}

/// Ad-hoc listing filter used by the presentation collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameFilter {
    /// Substring match on the primary name.
    pub name_contains: Option<String>,
    /// Keep games whose supported player range covers this count.
    pub player_count: Option<i64>,
    /// Substring match on the best-with descriptor.
    pub best_with: Option<String>,
    pub favorites_only: bool,
}

/// The three independent tag vocabularies a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagKind {
    Type,
    Category,
    Mechanism,
}

/// One listing row: the crawled record plus the user-owned bits the UI shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameWithAnnotation {
    pub game: GameRecord,
    pub is_favorite: bool,
    pub personal_rating: Option<i64>,
}

/// One page of filtered results with the unpaginated total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePage {
    pub rows: Vec<GameWithAnnotation>,
    pub total_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(external_id: i64) -> GameRecord {
        GameRecord {
            external_id,
            primary_name: "Terraforming Mars".to_string(),
            localized_name: None,
            image_url: None,
            player_count_min: None,
            player_count_max: None,
            players_best: None,
            players_recommended: None,
            play_time_min: None,
            play_time_max: None,
            minimum_age: None,
            complexity_weight: None,
            community_rating: None,
            type_tags: None,
            category_tags: None,
            mechanism_tags: None,
            detail_url: None,
        }
    }

    #[test]
    fn merge_fills_gaps_in_both_directions() {
        let mut stored = record(42);
        stored.community_rating = Some(7.5);
        let mut incoming = record(42);
        incoming.complexity_weight = Some(3.2);

        let merged = GameRecord::merge_missing(&stored, &incoming);
        assert_eq!(merged.community_rating, Some(7.5));
        assert_eq!(merged.complexity_weight, Some(3.2));
    }

    #[test]
    fn merge_never_replaces_populated_with_incoming() {
        let mut stored = record(1);
        stored.category_tags = Some("Economic, Science Fiction".to_string());
        stored.play_time_min = Some(90);
        let mut incoming = record(1);
        incoming.category_tags = Some("Economic".to_string());
        incoming.play_time_min = Some(60);

        let merged = GameRecord::merge_missing(&stored, &incoming);
        assert_eq!(
            merged.category_tags.as_deref(),
            Some("Economic, Science Fiction")
        );
        assert_eq!(merged.play_time_min, Some(90));
    }

    #[test]
    fn merge_treats_blank_text_as_empty() {
        let mut stored = record(1);
        stored.players_best = Some("  ".to_string());
        let mut incoming = record(1);
        incoming.players_best = Some("3".to_string());

        let merged = GameRecord::merge_missing(&stored, &incoming);
        assert_eq!(merged.players_best.as_deref(), Some("3"));
    }

    #[test]
    fn merge_keeps_populated_primary_name() {
        let mut stored = record(1);
        let mut incoming = record(1);
        incoming.primary_name = "Different Title".to_string();
        let merged = GameRecord::merge_missing(&stored, &incoming);
        assert_eq!(merged.primary_name, "Terraforming Mars");

        stored.primary_name = String::new();
        let merged = GameRecord::merge_missing(&stored, &incoming);
        assert_eq!(merged.primary_name, "Different Title");
    }

    #[test]
    fn merge_is_idempotent() {
        let mut stored = record(7);
        stored.community_rating = Some(6.8);
        let mut incoming = record(7);
        incoming.complexity_weight = Some(2.4);
        incoming.image_url = Some("https://cf.example/pic.jpg".to_string());

        let once = GameRecord::merge_missing(&stored, &incoming);
        let twice = GameRecord::merge_missing(&once, &incoming);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_never_empties_a_field_either_side_had() {
        let mut stored = record(9);
        stored.minimum_age = Some(12);
        let mut incoming = record(9);
        incoming.minimum_age = None;
        incoming.mechanism_tags = Some("Drafting".to_string());

        let merged = GameRecord::merge_missing(&stored, &incoming);
        assert_eq!(merged.minimum_age, Some(12));
        assert_eq!(merged.mechanism_tags.as_deref(), Some("Drafting"));
    }
}
