//! Scenarios shared by the in-memory and Postgres association store tests.
#![allow(dead_code)]

use anyhow::Result;
use catalog_core::{CatalogError, MediaFileLinkRepository, RequestContext};
use catalog_model::{FileId, MediaItemId, NewMediaFileLink};

pub const ITEM_A: MediaItemId = MediaItemId(1);
pub const ITEM_B: MediaItemId = MediaItemId(2);
pub const ITEM_C: MediaItemId = MediaItemId(3);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

async fn link<R: MediaFileLinkRepository + ?Sized>(
    repo: &R,
    item: MediaItemId,
    file: i64,
    primary: bool,
) -> Result<()> {
    repo.link_file_to_item(
        &RequestContext::new(),
        NewMediaFileLink::new(item, FileId(file)).primary(primary),
    )
    .await?;
    Ok(())
}

pub async fn link_then_lookup<R: MediaFileLinkRepository + ?Sized>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    let id = repo
        .link_file_to_item(
            &ctx,
            NewMediaFileLink::new(ITEM_A, FileId(100))
                .with_quality("1080p/x265")
                .with_language("en"),
        )
        .await?;

    let files = repo.files_by_item(&ctx, ITEM_A).await?;
    assert_eq!(files.len(), 1);
    let stored = &files[0];
    assert_eq!(stored.id, id);
    assert_eq!(stored.media_item_id, ITEM_A);
    assert_eq!(stored.file_id, FileId(100));
    assert_eq!(stored.quality_info.as_deref(), Some("1080p/x265"));
    assert_eq!(stored.language.as_deref(), Some("en"));
    assert!(!stored.is_primary);

    assert_eq!(repo.items_by_file(&ctx, FileId(100)).await?, vec![ITEM_A]);
    Ok(())
}

pub async fn empty_lookups_succeed<R: MediaFileLinkRepository + ?Sized>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    assert!(repo.files_by_item(&ctx, ITEM_C).await?.is_empty());
    assert!(repo.items_by_file(&ctx, FileId(999)).await?.is_empty());
    assert!(repo.duplicate_files(&ctx).await?.is_empty());
    assert_eq!(repo.count_by_item(&ctx, ITEM_C).await?, 0);
    Ok(())
}

pub async fn set_primary_moves_file_to_front<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_A, 100, false).await?;
    link(repo, ITEM_A, 200, false).await?;

    repo.set_primary(&ctx, ITEM_A, FileId(200)).await?;

    let files = repo.files_by_item(&ctx, ITEM_A).await?;
    let order: Vec<_> = files.iter().map(|f| (f.file_id, f.is_primary)).collect();
    assert_eq!(order, vec![(FileId(200), true), (FileId(100), false)]);

    repo.set_primary(&ctx, ITEM_A, FileId(100)).await?;
    let files = repo.files_by_item(&ctx, ITEM_A).await?;
    assert_eq!(files[0].file_id, FileId(100));
    assert!(files[0].is_primary);
    assert_eq!(files.iter().filter(|f| f.is_primary).count(), 1);
    Ok(())
}

pub async fn set_primary_clears_doubled_primaries<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_A, 100, true).await?;
    link(repo, ITEM_A, 200, true).await?;

    // Inserting with the primary flag does not demote the earlier primary.
    let files = repo.files_by_item(&ctx, ITEM_A).await?;
    assert_eq!(files.iter().filter(|f| f.is_primary).count(), 2);

    repo.set_primary(&ctx, ITEM_A, FileId(200)).await?;
    let files = repo.files_by_item(&ctx, ITEM_A).await?;
    let primaries: Vec<_> = files
        .iter()
        .filter(|f| f.is_primary)
        .map(|f| f.file_id)
        .collect();
    assert_eq!(primaries, vec![FileId(200)]);
    Ok(())
}

pub async fn set_primary_unknown_pairing_is_not_found<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_A, 100, true).await?;
    link(repo, ITEM_A, 200, false).await?;
    link(repo, ITEM_B, 300, false).await?;
    let before = repo.files_by_item(&ctx, ITEM_A).await?;

    let err = repo
        .set_primary(&ctx, ITEM_A, FileId(300))
        .await
        .expect_err("file 300 belongs to item B only");
    assert!(err.is_not_found(), "unexpected error: {err}");

    let after = repo.files_by_item(&ctx, ITEM_A).await?;
    assert_eq!(before, after);

    let err = repo
        .set_primary(&ctx, ITEM_C, FileId(100))
        .await
        .expect_err("item C has no files");
    assert!(matches!(err, CatalogError::NotFound(_)));
    Ok(())
}

pub async fn unlink_is_idempotent<R: MediaFileLinkRepository + ?Sized>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_A, 100, false).await?;
    link(repo, ITEM_A, 200, false).await?;

    repo.unlink_file(&ctx, ITEM_A, FileId(999)).await?;
    repo.unlink_file(&ctx, ITEM_B, FileId(100)).await?;
    assert_eq!(repo.count_by_item(&ctx, ITEM_A).await?, 2);

    repo.unlink_file(&ctx, ITEM_A, FileId(100)).await?;
    repo.unlink_file(&ctx, ITEM_A, FileId(100)).await?;
    let files = repo.files_by_item(&ctx, ITEM_A).await?;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_id, FileId(200));
    Ok(())
}

pub async fn unlink_removes_repeated_pairings<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_A, 100, false).await?;
    link(repo, ITEM_A, 100, false).await?;
    link(repo, ITEM_A, 200, false).await?;
    assert_eq!(repo.count_by_item(&ctx, ITEM_A).await?, 3);

    repo.unlink_file(&ctx, ITEM_A, FileId(100)).await?;
    assert_eq!(repo.count_by_item(&ctx, ITEM_A).await?, 1);
    Ok(())
}

pub async fn count_matches_lookup<R: MediaFileLinkRepository + ?Sized>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    for file in [10, 11, 12] {
        link(repo, ITEM_A, file, false).await?;
    }
    link(repo, ITEM_B, 10, false).await?;

    for item in [ITEM_A, ITEM_B, ITEM_C] {
        let count = repo.count_by_item(&ctx, item).await?;
        let files = repo.files_by_item(&ctx, item).await?;
        assert_eq!(count as usize, files.len(), "item {item}");
    }
    Ok(())
}

pub async fn items_by_file_oldest_first<R: MediaFileLinkRepository + ?Sized>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_C, 7, false).await?;
    link(repo, ITEM_A, 7, false).await?;
    link(repo, ITEM_C, 7, false).await?;
    link(repo, ITEM_B, 7, false).await?;

    assert_eq!(
        repo.items_by_file(&ctx, FileId(7)).await?,
        vec![ITEM_C, ITEM_A, ITEM_B]
    );
    Ok(())
}

pub async fn duplicates_group_by_distinct_items<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_A, 7, false).await?;
    link(repo, ITEM_B, 7, false).await?;
    link(repo, ITEM_A, 8, false).await?;

    let groups = repo.duplicate_files(&ctx).await?;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].file_id, FileId(7));
    assert_eq!(groups[0].item_count, 2);
    assert_eq!(groups[0].item_ids, vec![ITEM_A, ITEM_B]);
    Ok(())
}

pub async fn same_item_twice_is_not_a_duplicate<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    link(repo, ITEM_A, 5, false).await?;
    link(repo, ITEM_A, 5, false).await?;
    assert!(repo.duplicate_files(&ctx).await?.is_empty());

    link(repo, ITEM_B, 5, false).await?;
    let groups = repo.duplicate_files(&ctx).await?;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].item_count, 3);
    assert_eq!(groups[0].item_ids, vec![ITEM_A, ITEM_B]);
    assert_eq!(groups[0].distinct_items(), 2);
    Ok(())
}

pub async fn duplicate_groups_ordered_by_file<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    for file in [30, 10, 20] {
        link(repo, ITEM_B, file, false).await?;
        link(repo, ITEM_A, file, false).await?;
    }

    let groups = repo.duplicate_files(&ctx).await?;
    let files: Vec<_> = groups.iter().map(|g| g.file_id).collect();
    assert_eq!(files, vec![FileId(10), FileId(20), FileId(30)]);
    assert!(groups.iter().all(|g| g.item_ids == vec![ITEM_B, ITEM_A]));
    Ok(())
}

pub async fn concurrent_set_primary_leaves_one<
    R: MediaFileLinkRepository + ?Sized,
>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    for file in [100, 200, 300] {
        link(repo, ITEM_A, file, false).await?;
    }

    for _ in 0..10 {
        let (first, second) = tokio::join!(
            repo.set_primary(&ctx, ITEM_A, FileId(200)),
            repo.set_primary(&ctx, ITEM_A, FileId(300)),
        );
        first?;
        second?;

        let files = repo.files_by_item(&ctx, ITEM_A).await?;
        let primaries: Vec<_> = files
            .iter()
            .filter(|f| f.is_primary)
            .map(|f| f.file_id)
            .collect();
        assert_eq!(primaries.len(), 1, "exactly one primary: {primaries:?}");
        assert!(primaries[0] == FileId(200) || primaries[0] == FileId(300));
        assert_eq!(files[0].file_id, primaries[0]);
    }
    Ok(())
}

pub async fn cancelled_context_aborts<R: MediaFileLinkRepository + ?Sized>(
    repo: &R,
) -> Result<()> {
    let ctx = RequestContext::new();
    ctx.cancel();

    let err = repo
        .link_file_to_item(&ctx, NewMediaFileLink::new(ITEM_A, FileId(1)))
        .await
        .expect_err("context was cancelled");
    assert!(err.is_cancelled());

    let live = RequestContext::new();
    assert_eq!(repo.count_by_item(&live, ITEM_A).await?, 0);
    Ok(())
}
