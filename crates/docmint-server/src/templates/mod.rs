//! Template records and the store that holds them
//!
//! A template record pairs the uploaded document bytes with a generated tag
//! and, once rendering has finished, a preview image.
//!
//! # Tags
//!
//! Tags are derived by counting the records already stored and formatting
//! the count as `template` followed by at least four digits. The count is read
//! fresh on every store with no atomic sequence behind it, so two concurrent
//! stores can observe the same count and receive the same tag. Callers must
//! treat the tag as a label, never as a key; the record `id` is the key.
//!
//! # Implementations
//!
//! - [`PgTemplateStore`]: metadata in PostgreSQL, content in S3
//! - [`InMemoryTemplateStore`]: process-local, used by the router and pipeline tests

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::content::ContentStream;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryTemplateStore;
pub use postgres::PgTemplateStore;

/// Prefix shared by every generated tag.
pub const TAG_PREFIX: &str = "template";

/// Minimum number of digits in a tag's counter.
pub const TAG_WIDTH: usize = 4;

/// Format the tag for a record created when `count` records already exist
pub fn format_tag(count: i64) -> String {
    format!("{}{:0width$}", TAG_PREFIX, count, width = TAG_WIDTH)
}

/// True when `tag` has the generated `template` + digits shape
pub fn is_generated_tag(tag: &str) -> bool {
    tag.strip_prefix(TAG_PREFIX)
        .map(|digits| digits.len() >= TAG_WIDTH && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// A stored template and its metadata
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    pub id: Uuid,
    pub original_name: String,
    pub tag: String,
    pub content_type: String,
    pub size: i64,
    pub checksum: String,
    pub preview_image: Option<Bytes>,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub tag: String,
}

/// Input to [`TemplateStore::store`]
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub original_name: String,
    pub content_type: String,
    pub content: Bytes,
}

/// Partial update applied by [`TemplateStore::update_fields`].
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub preview_image: Option<Bytes>,
}

impl TemplatePatch {
    pub fn preview_image(image: Bytes) -> Self {
        Self {
            preview_image: Some(image),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.preview_image.is_none()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Template '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Blob storage error: {0}")]
    Blob(#[source] anyhow::Error),
}

/// Durable storage of template documents with metadata
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Persist a new template under a fresh identifier.
    ///
    /// Returns `Ok(None)` without writing anything when the declared content
    /// type is not the template document type.
    async fn store(&self, template: NewTemplate) -> Result<Option<TemplateRecord>, StoreError>;

    /// Stream a template's content; `StoreError::NotFound` if absent
    async fn open_read(&self, id: Uuid) -> Result<ContentStream, StoreError>;

    /// Apply a partial update; `Ok(None)` if no record matches
    async fn update_fields(
        &self,
        id: Uuid,
        patch: TemplatePatch,
    ) -> Result<Option<TemplateRecord>, StoreError>;

    /// All records in creation order
    async fn list(&self) -> Result<Vec<TemplateSummary>, StoreError>;

    /// Point lookup including preview bytes
    async fn get(&self, id: Uuid) -> Result<Option<TemplateRecord>, StoreError>;

    /// Number of stored records
    async fn count(&self) -> Result<i64, StoreError>;

    /// Cheap liveness probe of the backing store
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tag_pads_to_four_digits() {
        assert_eq!(format_tag(0), "template0000");
        assert_eq!(format_tag(7), "template0007");
        assert_eq!(format_tag(1234), "template1234");
    }

    #[test]
    fn test_format_tag_grows_past_width() {
        assert_eq!(format_tag(12345), "template12345");
    }

    #[test]
    fn test_is_generated_tag() {
        assert!(is_generated_tag("template0042"));
        assert!(is_generated_tag(&format_tag(99999)));
        assert!(!is_generated_tag("template42"));
        assert!(!is_generated_tag("templ0042"));
        assert!(!is_generated_tag("template00a2"));
    }

    #[test]
    fn test_patch_emptiness() {
        assert!(TemplatePatch::default().is_empty());
        assert!(!TemplatePatch::preview_image(Bytes::from_static(b"jpg")).is_empty());
    }
}
