use crate::chrono::{DateTime, Utc};
use crate::ids::{FileId, MediaFileLinkId, MediaItemId};

/// One association between a media item and a file backing it.
///
/// `media_item_id` and `file_id` never change after creation; pointing an item
/// at a different file is an unlink followed by a new link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaFileLink {
    pub id: MediaFileLinkId,
    pub media_item_id: MediaItemId,
    pub file_id: FileId,
    pub quality_info: Option<String>,
    pub language: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert request for a new association.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewMediaFileLink {
    pub media_item_id: MediaItemId,
    pub file_id: FileId,
    pub quality_info: Option<String>,
    pub language: Option<String>,
    pub is_primary: bool,
}

impl NewMediaFileLink {
    pub fn new(media_item_id: MediaItemId, file_id: FileId) -> Self {
        Self {
            media_item_id,
            file_id,
            quality_info: None,
            language: None,
            is_primary: false,
        }
    }

    pub fn with_quality(mut self, quality_info: impl Into<String>) -> Self {
        self.quality_info = Some(quality_info.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Request the primary flag on insert.
    ///
    /// Other primaries of the same item are left untouched; route primary
    /// changes through `set_primary` to keep a single primary per item.
    pub fn primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }
}

/// A file referenced by two or more distinct media items.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DuplicateFileGroup {
    pub file_id: FileId,
    /// Total number of associations pointing at the file.
    pub item_count: u64,
    /// Distinct items referencing the file, oldest link first.
    pub item_ids: Vec<MediaItemId>,
}

impl DuplicateFileGroup {
    pub fn distinct_items(&self) -> usize {
        self.item_ids.len()
    }
}
