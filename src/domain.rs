//! Domain layer: catalog entities, user annotations, and source abstractions
//!
//! Pure data types and the merge policy live here; everything that talks to
//! the network or the database lives in the infrastructure layer.

pub mod annotation;
pub mod game;
pub mod services;

pub use annotation::{Review, UserAnnotation};
pub use game::{GameFilter, GamePage, GameRecord, GameWithAnnotation, TagKind, Upserted};
pub use services::{GameSource, SourceError};
