//! Listing page parser
//!
//! Listing pages are HTML tables; each game row carries a `row_`-prefixed id
//! and a primary link whose path embeds the game's numeric identifier.

use anyhow::{Result, anyhow};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

/// Extracts external ids from one listing page, in document order.
pub struct ListingPageParser {
    game_row: Selector,
    primary_link: Selector,
    id_in_href: Regex,
}

impl ListingPageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            game_row: Selector::parse(r#"tr[id^="row_"]"#)
                .map_err(|e| anyhow!("invalid row selector: {e}"))?,
            primary_link: Selector::parse("a.primary")
                .map_err(|e| anyhow!("invalid link selector: {e}"))?,
            id_in_href: Regex::new(r"/boardgame/(\d+)")?,
        })
    }

    /// All ids on the page; malformed rows are skipped, an empty result means
    /// the listing is exhausted. Duplicate suppression is the caller's job.
    pub fn game_ids(&self, raw: &str) -> Vec<i64> {
        let document = Html::parse_document(raw);
        let ids: Vec<i64> = document
            .select(&self.game_row)
            .filter_map(|row| {
                let link = row.select(&self.primary_link).next()?;
                let href = link.value().attr("href")?;
                let captures = self.id_in_href.captures(href)?;
                captures[1].parse().ok()
            })
            .collect();
        debug!(count = ids.len(), "extracted listing ids");
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_in_document_order() {
        let parser = ListingPageParser::new().unwrap();
        let page = r#"
            <table>
              <tr id="row_1"><td><a class="primary" href="/boardgame/174430/gloomhaven">Gloomhaven</a></td></tr>
              <tr id="row_2"><td><a class="primary" href="/boardgame/167791/terraforming-mars">Terraforming Mars</a></td></tr>
              <tr id="row_3"><td><a class="primary" href="/boardgame/224517/brass-birmingham">Brass</a></td></tr>
            </table>
        "#;
        assert_eq!(parser.game_ids(page), vec![174430, 167791, 224517]);
    }

    #[test]
    fn skips_rows_without_a_usable_link() {
        let parser = ListingPageParser::new().unwrap();
        let page = r#"
            <table>
              <tr id="row_1"><td>no link here</td></tr>
              <tr id="row_2"><td><a class="primary" href="/geeklist/42">not a game path</a></td></tr>
              <tr id="row_3"><td><a class="primary" href="/boardgame/13/catan">Catan</a></td></tr>
              <tr id="other"><td><a class="primary" href="/boardgame/99/ignored">header row</a></td></tr>
            </table>
        "#;
        assert_eq!(parser.game_ids(page), vec![13]);
    }

    #[test]
    fn empty_page_yields_no_ids() {
        let parser = ListingPageParser::new().unwrap();
        assert!(parser.game_ids("<table></table>").is_empty());
        assert!(parser.game_ids("").is_empty());
    }
}
