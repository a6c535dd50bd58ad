//! Repository ports (interfaces).
//!
//! Implementations live in the Postgres adapter under `database::postgres` and
//! the in-memory adapter under `database::memory`.

pub mod media_file_links;

pub use media_file_links::MediaFileLinkRepository;
