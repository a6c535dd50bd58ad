//! In-process adapter, for embedding and tests.

pub mod media_file_links;

pub use media_file_links::InMemoryMediaFileLinkRepository;
