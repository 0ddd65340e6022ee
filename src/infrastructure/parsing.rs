//! Markup parsing for the remote catalog
//!
//! Two parsers: one for listing pages (HTML tables carrying item ids) and one
//! for item detail payloads (XML-ish markup). Both treat structural absence
//! as data, not as a fault.

pub mod detail_parser;
pub mod error;
pub mod list_parser;

pub use detail_parser::GameDetailParser;
pub use error::{ParseError, ParsingResult};
pub use list_parser::ListingPageParser;
