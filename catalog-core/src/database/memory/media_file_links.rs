use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_model::{
    DuplicateFileGroup, FileId, MediaFileLink, MediaFileLinkId, MediaItemId,
    NewMediaFileLink,
};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::database::ports::MediaFileLinkRepository;
use crate::error::{CatalogError, Result};

#[derive(Debug, Default)]
struct LinkTable {
    next_id: i64,
    rows: Vec<MediaFileLink>,
}

impl LinkTable {
    fn rows_for_file(&self, file_id: FileId) -> Vec<&MediaFileLink> {
        let mut rows: Vec<_> =
            self.rows.iter().filter(|row| row.file_id == file_id).collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows
    }

    /// Distinct items in order of their oldest link.
    fn item_ids_for_file(&self, file_id: FileId) -> Vec<MediaItemId> {
        let mut item_ids = Vec::new();
        for row in self.rows_for_file(file_id) {
            if !item_ids.contains(&row.media_item_id) {
                item_ids.push(row.media_item_id);
            }
        }
        item_ids
    }
}

/// Association store kept in process memory.
///
/// Each operation holds the table lock for its whole duration, so a primary
/// switch is never observable half-done.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMediaFileLinkRepository {
    table: Arc<Mutex<LinkTable>>,
}

impl InMemoryMediaFileLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored association, in insertion order.
    pub async fn snapshot(&self) -> Vec<MediaFileLink> {
        self.table.lock().await.rows.clone()
    }
}

#[async_trait]
impl MediaFileLinkRepository for InMemoryMediaFileLinkRepository {
    async fn link_file_to_item(
        &self,
        ctx: &RequestContext,
        link: NewMediaFileLink,
    ) -> Result<MediaFileLinkId> {
        ctx.run("link_file_to_item", async {
            let mut table = self.table.lock().await;
            table.next_id += 1;
            let id = MediaFileLinkId(table.next_id);
            table.rows.push(MediaFileLink {
                id,
                media_item_id: link.media_item_id,
                file_id: link.file_id,
                quality_info: link.quality_info,
                language: link.language,
                is_primary: link.is_primary,
                created_at: Utc::now(),
            });
            debug!(link_id = %id, "linked file to media item");
            Ok(id)
        })
        .await
    }

    async fn unlink_file(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
        file_id: FileId,
    ) -> Result<()> {
        ctx.run("unlink_file", async {
            let mut table = self.table.lock().await;
            let before = table.rows.len();
            table.rows.retain(|row| {
                !(row.media_item_id == media_item_id && row.file_id == file_id)
            });
            debug!(
                %media_item_id,
                %file_id,
                removed = before - table.rows.len(),
                "unlinked file from media item"
            );
            Ok(())
        })
        .await
    }

    async fn files_by_item(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<Vec<MediaFileLink>> {
        ctx.run("files_by_item", async {
            let table = self.table.lock().await;
            let mut rows: Vec<MediaFileLink> = table
                .rows
                .iter()
                .filter(|row| row.media_item_id == media_item_id)
                .cloned()
                .collect();
            rows.sort_by_key(|row| (!row.is_primary, row.created_at, row.id));
            Ok(rows)
        })
        .await
    }

    async fn items_by_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
    ) -> Result<Vec<MediaItemId>> {
        ctx.run("items_by_file", async {
            Ok(self.table.lock().await.item_ids_for_file(file_id))
        })
        .await
    }

    async fn duplicate_files(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<DuplicateFileGroup>> {
        ctx.run("duplicate_files", async {
            let table = self.table.lock().await;

            let mut counts: BTreeMap<FileId, u64> = BTreeMap::new();
            for row in &table.rows {
                *counts.entry(row.file_id).or_default() += 1;
            }

            let groups: Vec<DuplicateFileGroup> = counts
                .into_iter()
                .filter_map(|(file_id, item_count)| {
                    let item_ids = table.item_ids_for_file(file_id);
                    (item_ids.len() > 1).then_some(DuplicateFileGroup {
                        file_id,
                        item_count,
                        item_ids,
                    })
                })
                .collect();

            debug!(groups = groups.len(), "duplicate file scan complete");
            Ok(groups)
        })
        .await
    }

    async fn count_by_item(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<u64> {
        ctx.run("count_by_item", async {
            let table = self.table.lock().await;
            let count = table
                .rows
                .iter()
                .filter(|row| row.media_item_id == media_item_id)
                .count();
            Ok(count as u64)
        })
        .await
    }

    async fn set_primary(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
        file_id: FileId,
    ) -> Result<()> {
        ctx.run("set_primary", async {
            let mut table = self.table.lock().await;

            let linked = table.rows.iter().any(|row| {
                row.media_item_id == media_item_id && row.file_id == file_id
            });
            if !linked {
                warn!(
                    %media_item_id,
                    %file_id,
                    "set_primary target is not linked; primary left unchanged"
                );
                return Err(CatalogError::NotFound(format!(
                    "file {file_id} is not linked to media item {media_item_id}"
                )));
            }

            for row in table
                .rows
                .iter_mut()
                .filter(|row| row.media_item_id == media_item_id)
            {
                row.is_primary = row.file_id == file_id;
            }
            debug!(%media_item_id, %file_id, "primary file switched");
            Ok(())
        })
        .await
    }
}
