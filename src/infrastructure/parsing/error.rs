//! Parsing error types
//!
//! A missing optional sub-element never produces an error — the parser maps
//! it to a null field. Errors are reserved for payloads that cannot yield a
//! record at all.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("payload contains no item element")]
    MissingItem,

    #[error("required field '{field}' not found in payload")]
    RequiredFieldMissing { field: String },

    #[error("invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },
}

impl ParseError {
    pub fn required_field_missing(field: &str) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
        }
    }

    pub fn invalid_selector(selector: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParseError>;
