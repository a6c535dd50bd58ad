//! Core data model definitions shared across catalog crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod ids;
pub mod links;

pub use ids::{FileId, MediaFileLinkId, MediaItemId};
pub use links::{DuplicateFileGroup, MediaFileLink, NewMediaFileLink};
