use async_trait::async_trait;
use catalog_model::{
    DuplicateFileGroup, FileId, MediaFileLink, MediaFileLinkId, MediaItemId,
    NewMediaFileLink,
};

use crate::context::RequestContext;
use crate::error::Result;

/// Repository port for the media item ↔ file relation.
///
/// Lookups on unknown ids return empty results, never errors. Every call is
/// bounded by the supplied [`RequestContext`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFileLinkRepository: Send + Sync {
    /// Insert a new association and return its id.
    ///
    /// Passing `is_primary = true` does not demote an existing primary of the
    /// same item. Callers that need a single primary must follow up with
    /// [`set_primary`](Self::set_primary).
    async fn link_file_to_item(
        &self,
        ctx: &RequestContext,
        link: NewMediaFileLink,
    ) -> Result<MediaFileLinkId>;

    /// Remove every association between `media_item_id` and `file_id`.
    /// Removing a pairing that does not exist succeeds.
    async fn unlink_file(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
        file_id: FileId,
    ) -> Result<()>;

    /// Associations of an item: primary first, then oldest first.
    async fn files_by_item(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<Vec<MediaFileLink>>;

    /// Distinct items referencing a file, oldest link first.
    async fn items_by_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
    ) -> Result<Vec<MediaItemId>>;

    /// Files referenced by two or more distinct items, ordered by file id.
    async fn duplicate_files(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<DuplicateFileGroup>>;

    async fn count_by_item(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<u64>;

    /// Make `file_id` the only primary file of `media_item_id`.
    ///
    /// Fails with `NotFound` when the file is not linked to the item, in which
    /// case the existing primary is kept.
    async fn set_primary(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
        file_id: FileId,
    ) -> Result<()>;
}
