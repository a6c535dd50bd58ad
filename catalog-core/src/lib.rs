//! # Catalog Core
//!
//! Media-file association store for the catalog: the many-to-many relation
//! between logical media items (a movie, an album, a show) and the physical
//! files that back them.
//!
//! ## Overview
//!
//! - **Association mutation**: link, unlink and primary selection
//! - **Association lookup**: files of an item, items of a file
//! - **Duplicate discovery**: files referenced by more than one item
//! - **Counting**: orphan detection for items without files
//!
//! Media items and files are owned by other catalog stores; they appear here
//! only as opaque numeric ids (see [`catalog_model`]).
//!
//! ## Architecture
//!
//! - [`database::ports`]: the [`MediaFileLinkRepository`] trait
//! - [`database::postgres`]: PostgreSQL adapter built on SQLx
//! - [`database::memory`]: in-process adapter
//! - [`service`]: catalog-facing helpers over the port
//! - [`context`]: per-request cancellation and deadlines
//! - [`config`]: database configuration loading
//!
//! ## Primary files
//!
//! At most one association per item is primary, but only
//! [`MediaFileLinkRepository::set_primary`] enforces it. Inserting a link with
//! the primary flag set does not demote an existing primary; use
//! [`MediaFileAssociations::link_as_primary`] when that is what you want.
//!
//! ## Examples
//!
//! ```no_run
//! use catalog_core::{
//!     DatabaseConfig, PostgresDatabase, RequestContext,
//!     database::MediaFileLinkRepository,
//! };
//! use catalog_model::{FileId, MediaItemId, NewMediaFileLink};
//! use std::time::Duration;
//!
//! async fn pick_primary() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::load(None)?;
//!     let db = PostgresDatabase::connect(&config).await?;
//!     db.migrate().await?;
//!
//!     let links = db.media_file_links();
//!     let ctx = RequestContext::with_timeout(Duration::from_secs(5));
//!     let item = MediaItemId(1);
//!
//!     links
//!         .link_file_to_item(&ctx, NewMediaFileLink::new(item, FileId(100)))
//!         .await?;
//!     links
//!         .link_file_to_item(
//!             &ctx,
//!             NewMediaFileLink::new(item, FileId(200)).with_quality("2160p"),
//!         )
//!         .await?;
//!     links.set_primary(&ctx, item, FileId(200)).await?;
//!
//!     let files = links.files_by_item(&ctx, item).await?;
//!     assert_eq!(files[0].file_id, FileId(200));
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Database configuration loading
pub mod config;

/// Per-request cancellation and deadlines
pub mod context;

/// Repository ports and their Postgres / in-memory adapters
pub mod database;

/// Error types and error handling utilities
pub mod error;

/// Services layered over the repository ports
pub mod service;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use config::{ConfigLoadError, DatabaseConfig};
pub use context::RequestContext;
pub use database::{
    InMemoryMediaFileLinkRepository, MediaFileLinkRepository,
    PostgresDatabase, PostgresMediaFileLinkRepository,
};
pub use error::{CatalogError, Result};
pub use service::MediaFileAssociations;
