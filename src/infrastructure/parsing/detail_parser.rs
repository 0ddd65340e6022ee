//! Item detail payload parser
//!
//! Extracts one normalized `GameRecord` from the catalog's XML-ish detail
//! markup. Every optional sub-element is tolerated as absent; numeric fields
//! guarded by the source's "N/A" sentinel; tag links of the three known kinds
//! are collected into independent ordered lists.

use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::{ParseError, ParsingResult};
use crate::domain::game::GameRecord;

/// Sentinel the source emits for statistics it has no data for.
const NOT_AVAILABLE: &str = "N/A";

/// Parser for one item detail payload.
pub struct GameDetailParser {
    detail_url_base: String,
    item: Selector,
    primary_name: Selector,
    any_name: Selector,
    image: Selector,
    min_players: Selector,
    max_players: Selector,
    min_play_time: Selector,
    max_play_time: Selector,
    minimum_age: Selector,
    community_rating: Selector,
    complexity_weight: Selector,
    best_with: Selector,
    recommended_with: Selector,
    type_links: Selector,
    category_links: Selector,
    mechanism_links: Selector,
}

impl GameDetailParser {
    /// Create a parser; `detail_url_base` is the site root used to build each
    /// record's browse URL.
    pub fn new(detail_url_base: &str) -> Result<Self> {
        Ok(Self {
            detail_url_base: detail_url_base.trim_end_matches('/').to_string(),
            item: compile("item")?,
            primary_name: compile(r#"name[type="primary"]"#)?,
            any_name: compile("name")?,
            // The HTML tree builder rewrites <image> into the void <img>,
            // which pushes the URL text into a following sibling node.
            image: compile("img, image")?,
            min_players: compile("minplayers")?,
            max_players: compile("maxplayers")?,
            min_play_time: compile("minplaytime")?,
            max_play_time: compile("maxplaytime")?,
            minimum_age: compile("minage")?,
            community_rating: compile("statistics ratings bayesaverage")?,
            complexity_weight: compile("statistics ratings averageweight")?,
            best_with: compile(
                r#"poll-summary[name="suggested_numplayers"] result[name="bestwith"]"#,
            )?,
            // The feed really spells the attribute with three m's.
            recommended_with: compile(
                r#"poll-summary[name="suggested_numplayers"] result[name="recommmendedwith"]"#,
            )?,
            type_links: compile(r#"link[type="boardgamesubdomain"]"#)?,
            category_links: compile(r#"link[type="boardgamecategory"]"#)?,
            mechanism_links: compile(r#"link[type="boardgamemechanic"]"#)?,
        })
    }

    /// Parse one detail payload into a normalized record.
    ///
    /// Only a payload with no usable `<item>` (or no identity / primary name)
    /// is an error; any missing sub-field becomes a null field.
    pub fn parse(&self, raw: &str) -> ParsingResult<GameRecord> {
        let document = Html::parse_document(raw);
        let item = document
            .select(&self.item)
            .next()
            .ok_or(ParseError::MissingItem)?;

        let external_id = item
            .value()
            .attr("id")
            .and_then(|id| id.trim().parse::<i64>().ok())
            .ok_or_else(|| ParseError::required_field_missing("item id"))?;

        let primary_name = attr_value(&item, &self.primary_name)
            .ok_or_else(|| ParseError::required_field_missing("primary name"))?;

        let (player_count_min, player_count_max) = normalize_range(
            integer_field(&item, &self.min_players),
            integer_field(&item, &self.max_players),
        );

        let record = GameRecord {
            external_id,
            primary_name,
            localized_name: self.extract_localized_name(&item),
            image_url: self.extract_image_url(&item),
            player_count_min,
            player_count_max,
            players_best: attr_value(&item, &self.best_with)
                .map(|value| strip_poll_phrase(&value, "Best with ")),
            players_recommended: attr_value(&item, &self.recommended_with)
                .map(|value| strip_poll_phrase(&value, "Recommended with ")),
            play_time_min: integer_field(&item, &self.min_play_time),
            play_time_max: integer_field(&item, &self.max_play_time),
            minimum_age: integer_field(&item, &self.minimum_age),
            complexity_weight: float_field(&item, &self.complexity_weight),
            community_rating: float_field(&item, &self.community_rating),
            type_tags: tag_list(&item, &self.type_links),
            category_tags: tag_list(&item, &self.category_links),
            mechanism_tags: tag_list(&item, &self.mechanism_links),
            detail_url: Some(format!("{}/boardgame/{}", self.detail_url_base, external_id)),
        };

        debug!(external_id, name = %record.primary_name, "parsed detail payload");
        Ok(record)
    }

    /// First name variant written in Hangul, if the item carries one.
    fn extract_localized_name(&self, item: &ElementRef<'_>) -> Option<String> {
        item.select(&self.any_name)
            .filter_map(|element| element.value().attr("value"))
            .find(|value| contains_hangul(value))
            .map(str::to_string)
    }

    fn extract_image_url(&self, item: &ElementRef<'_>) -> Option<String> {
        let element = item.select(&self.image).next()?;
        let text = element.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
        element
            .next_sibling()
            .and_then(|node| match node.value() {
                Node::Text(text) => Some(text.trim().to_string()),
                _ => None,
            })
            .filter(|text| !text.is_empty())
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid selector '{selector}': {e}"))
}

/// First match's `value` attribute, blank-filtered.
fn attr_value(scope: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|element| element.value().attr("value"))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn integer_field(scope: &ElementRef<'_>, selector: &Selector) -> Option<i64> {
    attr_value(scope, selector)
        .filter(|value| value != NOT_AVAILABLE)
        .and_then(|value| value.parse().ok())
}

fn float_field(scope: &ElementRef<'_>, selector: &Selector) -> Option<f64> {
    attr_value(scope, selector)
        .filter(|value| value != NOT_AVAILABLE)
        .and_then(|value| value.parse().ok())
}

/// The source occasionally reports inverted ranges; repair by swapping.
fn normalize_range(min: Option<i64>, max: Option<i64>) -> (Option<i64>, Option<i64>) {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => (Some(hi), Some(lo)),
        other => other,
    }
}

/// "Best with 2-4 players" -> "2-4".
fn strip_poll_phrase(value: &str, prefix: &str) -> String {
    let value = value.strip_prefix(prefix).unwrap_or(value);
    value.strip_suffix(" players").unwrap_or(value).trim().to_string()
}

fn tag_list(scope: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let tags: Vec<&str> = scope
        .select(selector)
        .filter_map(|element| element.value().attr("value"))
        .collect();
    (!tags.is_empty()).then(|| tags.join(", "))
}

fn contains_hangul(text: &str) -> bool {
    text.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))
}
