use async_trait::async_trait;
use catalog_model::{
    DuplicateFileGroup, FileId, MediaFileLink, MediaFileLinkId, MediaItemId,
    NewMediaFileLink,
};
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::database::ports::MediaFileLinkRepository;
use crate::error::{CatalogError, Result};

#[derive(Debug, sqlx::FromRow)]
struct MediaFileLinkRow {
    id: i64,
    media_item_id: i64,
    file_id: i64,
    quality_info: Option<String>,
    language: Option<String>,
    is_primary: bool,
    created_at: DateTime<Utc>,
}

impl From<MediaFileLinkRow> for MediaFileLink {
    fn from(row: MediaFileLinkRow) -> Self {
        MediaFileLink {
            id: MediaFileLinkId(row.id),
            media_item_id: MediaItemId(row.media_item_id),
            file_id: FileId(row.file_id),
            quality_info: row.quality_info,
            language: row.language,
            is_primary: row.is_primary,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DuplicateCandidateRow {
    file_id: i64,
    item_count: i64,
}

#[derive(Clone, Debug)]
pub struct PostgresMediaFileLinkRepository {
    pool: PgPool,
}

impl PostgresMediaFileLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_item_ids<'e, E>(
        executor: E,
        operation: &'static str,
        file_id: FileId,
    ) -> Result<Vec<MediaItemId>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT media_item_id
            FROM media_files
            WHERE file_id = $1
            GROUP BY media_item_id
            ORDER BY MIN(created_at) ASC, MIN(id) ASC
            "#,
        )
        .bind(file_id.as_i64())
        .fetch_all(executor)
        .await
        .map_err(|e| CatalogError::storage(operation, e))?;

        Ok(ids.into_iter().map(MediaItemId).collect())
    }

    async fn set_primary_in_transaction(
        &self,
        media_item_id: MediaItemId,
        file_id: FileId,
    ) -> Result<()> {
        const OP: &str = "set_primary";

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| CatalogError::storage(OP, e))?;

        // Lock the item's rows in id order so concurrent switches for the
        // same item queue up instead of deadlocking.
        sqlx::query(
            r#"
            SELECT id
            FROM media_files
            WHERE media_item_id = $1
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(media_item_id.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| CatalogError::storage(OP, e))?;

        sqlx::query(
            "UPDATE media_files SET is_primary = FALSE WHERE media_item_id = $1",
        )
        .bind(media_item_id.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| CatalogError::storage(OP, e))?;

        let result = sqlx::query(
            r#"
            UPDATE media_files
            SET is_primary = TRUE
            WHERE media_item_id = $1 AND file_id = $2
            "#,
        )
        .bind(media_item_id.as_i64())
        .bind(file_id.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| CatalogError::storage(OP, e))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| CatalogError::storage(OP, e))?;
            warn!(
                %media_item_id,
                %file_id,
                "set_primary target is not linked; primary left unchanged"
            );
            return Err(CatalogError::NotFound(format!(
                "file {file_id} is not linked to media item {media_item_id}"
            )));
        }

        tx.commit().await.map_err(|e| CatalogError::storage(OP, e))?;
        debug!(%media_item_id, %file_id, "primary file switched");
        Ok(())
    }

    async fn duplicate_files_snapshot(&self) -> Result<Vec<DuplicateFileGroup>> {
        const OP: &str = "duplicate_files";

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| CatalogError::storage(OP, e))?;

        // Both passes read one snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| CatalogError::storage(OP, e))?;

        let candidates = sqlx::query_as::<_, DuplicateCandidateRow>(
            r#"
            SELECT file_id, COUNT(*) AS item_count
            FROM media_files
            GROUP BY file_id
            HAVING COUNT(DISTINCT media_item_id) > 1
            ORDER BY file_id
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| CatalogError::storage(OP, e))?;

        let mut groups = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let file_id = FileId(candidate.file_id);
            let item_ids = Self::fetch_item_ids(&mut *tx, OP, file_id).await?;
            groups.push(DuplicateFileGroup {
                file_id,
                item_count: candidate.item_count as u64,
                item_ids,
            });
        }

        tx.commit().await.map_err(|e| CatalogError::storage(OP, e))?;
        debug!(groups = groups.len(), "duplicate file scan complete");
        Ok(groups)
    }
}

#[async_trait]
impl MediaFileLinkRepository for PostgresMediaFileLinkRepository {
    async fn link_file_to_item(
        &self,
        ctx: &RequestContext,
        link: NewMediaFileLink,
    ) -> Result<MediaFileLinkId> {
        ctx.run("link_file_to_item", async {
            let id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO media_files
                    (media_item_id, file_id, quality_info, language, is_primary, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(link.media_item_id.as_i64())
            .bind(link.file_id.as_i64())
            .bind(link.quality_info.as_deref())
            .bind(link.language.as_deref())
            .bind(link.is_primary)
            .bind(Utc::now())
            .fetch_one(self.pool())
            .await
            .map_err(|e| CatalogError::storage("link_file_to_item", e))?;

            debug!(
                media_item_id = %link.media_item_id,
                file_id = %link.file_id,
                link_id = id,
                is_primary = link.is_primary,
                "linked file to media item"
            );
            Ok(MediaFileLinkId(id))
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
            let result = sqlx::query(
                "DELETE FROM media_files WHERE media_item_id = $1 AND file_id = $2",
            )
            .bind(media_item_id.as_i64())
            .bind(file_id.as_i64())
            .execute(self.pool())
            .await
            .map_err(|e| CatalogError::storage("unlink_file", e))?;

            debug!(
                %media_item_id,
                %file_id,
                removed = result.rows_affected(),
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
            let rows = sqlx::query_as::<_, MediaFileLinkRow>(
                r#"
                SELECT id, media_item_id, file_id, quality_info, language, is_primary, created_at
                FROM media_files
                WHERE media_item_id = $1
                ORDER BY is_primary DESC, created_at ASC, id ASC
                "#,
            )
            .bind(media_item_id.as_i64())
            .fetch_all(self.pool())
            .await
            .map_err(|e| CatalogError::storage("files_by_item", e))?;

            Ok(rows.into_iter().map(MediaFileLink::from).collect())
        })
        .await
    }

    async fn items_by_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
    ) -> Result<Vec<MediaItemId>> {
        ctx.run(
            "items_by_file",
            Self::fetch_item_ids(self.pool(), "items_by_file", file_id),
        )
        .await
    }

    async fn duplicate_files(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<DuplicateFileGroup>> {
        ctx.run("duplicate_files", self.duplicate_files_snapshot())
            .await
    }

    async fn count_by_item(
        &self,
        ctx: &RequestContext,
        media_item_id: MediaItemId,
    ) -> Result<u64> {
        ctx.run("count_by_item", async {
            let count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM media_files WHERE media_item_id = $1",
            )
            .bind(media_item_id.as_i64())
            .fetch_one(self.pool())
            .await
            .map_err(|e| CatalogError::storage("count_by_item", e))?;

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
        ctx.run(
            "set_primary",
            self.set_primary_in_transaction(media_item_id, file_id),
        )
        .await
    }
}
