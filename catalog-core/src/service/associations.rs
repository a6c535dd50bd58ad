use std::sync::Arc;

use catalog_model::{
    FileId, MediaFileLink, MediaFileLinkId, MediaItemId, NewMediaFileLink,
};
use tracing::debug;

use crate::context::RequestContext;
use crate::database::ports::MediaFileLinkRepository;
use crate::error::Result;

/// Catalog-facing helpers layered over a [`MediaFileLinkRepository`].
#[derive(Debug)]
pub struct MediaFileAssociations<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for MediaFileAssociations<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> MediaFileAssociations<R>
where
    R: MediaFileLinkRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        self.repo.as_ref()
    }

    /// The file to stream for an item: its primary when one is set, otherwise
    /// the oldest link.
    pub async fn preferred_file(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<Option<MediaFileLink>> {
        let files = self.repo.files_by_item(ctx, media_item_id).await?;
        Ok(files.into_iter().next())
    }

    pub async fn primary_file(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<Option<MediaFileLink>> {
        let files = self.repo.files_by_item(ctx, media_item_id).await?;
        Ok(files.into_iter().next().filter(|link| link.is_primary))
    }

    /// True when no file backs the item.
    pub async fn is_orphaned(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<bool> {
        Ok(self.repo.count_by_item(ctx, media_item_id).await? == 0)
    }

    /// Link a file and make it the item's only primary.
    ///
    /// The link row survives a failed primary switch; the error is still
    /// returned so the caller can retry the switch.
    pub async fn link_as_primary(
        &self,
        ctx: &RequestContext,
        link: NewMediaFileLink,
    ) -> Result<MediaFileLinkId> {
        let media_item_id = link.media_item_id;
        let file_id = link.file_id;

        let id = self
            .repo
            .link_file_to_item(ctx, link.primary(false))
            .await?;
        self.repo.set_primary(ctx, media_item_id, file_id).await?;

        debug!(%media_item_id, %file_id, link_id = %id, "linked as primary");
        Ok(id)
    }

    /// Other items that share `file_id` with `media_item_id`.
    pub async fn shared_items(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
        file_id: FileId,
    ) -> Result<Vec<MediaItemId>> {
        let mut items = self.repo.items_by_file(ctx, file_id).await?;
        items.retain(|item| *item != media_item_id);
        Ok(items)
    }
}
