//! PostgreSQL + S3 template store
//!
//! Record metadata and preview images live in the `templates` table; template
//! content is written to the blob bucket under `templates/{id}/{filename}`.

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use docmint_common::media;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    format_tag, NewTemplate, StoreError, TemplatePatch, TemplateRecord, TemplateStore,
    TemplateSummary,
};
use crate::content::ContentStream;
use crate::storage::Storage;

const RECORD_COLUMNS: &str =
    "id, original_name, tag, content_type, size, checksum, preview_image, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    original_name: String,
    tag: String,
    content_type: String,
    size: i64,
    checksum: String,
    preview_image: Option<Vec<u8>>,
    created_at: DateTime<Utc>,
}

impl From<TemplateRow> for TemplateRecord {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: row.id,
            original_name: row.original_name,
            tag: row.tag,
            content_type: row.content_type,
            size: row.size,
            checksum: row.checksum,
            preview_image: row.preview_image.map(Bytes::from),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    tag: String,
}

#[derive(Clone)]
pub struct PgTemplateStore {
    db: PgPool,
    storage: Storage,
}

impl PgTemplateStore {
    pub fn new(db: PgPool, storage: Storage) -> Self {
        Self { db, storage }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    #[instrument(skip(self, template), fields(name = %template.original_name))]
    async fn store(&self, template: NewTemplate) -> Result<Option<TemplateRecord>, StoreError> {
        if !media::is_template_type(&template.content_type) {
            debug!(content_type = %template.content_type, "Skipping store of non-template content");
            return Ok(None);
        }

        // Count-then-format: concurrent stores may compute the same tag.
        let tag = format_tag(self.count().await?);
        let id = Uuid::new_v4();
        let key = self.storage.template_key(id, &template.original_name);

        let upload = self
            .storage
            .upload(&key, template.content, Some(&template.content_type))
            .await
            .map_err(StoreError::Blob)?;

        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            INSERT INTO templates (id, original_name, tag, content_type, object_key, size, checksum)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&template.original_name)
        .bind(&tag)
        .bind(&template.content_type)
        .bind(&upload.key)
        .bind(upload.size)
        .bind(&upload.checksum)
        .fetch_one(&self.db)
        .await;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                // No row will ever point at the object; remove it before failing.
                if let Err(cleanup) = self.storage.delete(&upload.key).await {
                    warn!(key = %upload.key, error = %cleanup, "Failed to remove orphaned template content");
                }
                return Err(e.into());
            },
        };

        info!(template_id = %id, tag = %tag, size = upload.size, "Template stored");

        Ok(Some(row.into()))
    }

    #[instrument(skip(self))]
    async fn open_read(&self, id: Uuid) -> Result<ContentStream, StoreError> {
        let key: Option<String> =
            sqlx::query_scalar("SELECT object_key FROM templates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        let key = key.ok_or(StoreError::NotFound(id))?;
        self.storage
            .download_stream(&key)
            .await
            .map_err(StoreError::Blob)
    }

    #[instrument(skip(self, patch))]
    async fn update_fields(
        &self,
        id: Uuid,
        patch: TemplatePatch,
    ) -> Result<Option<TemplateRecord>, StoreError> {
        let preview: Option<Vec<u8>> = patch.preview_image.map(|b| b.to_vec());

        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            UPDATE templates
            SET preview_image = COALESCE($2, preview_image)
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(preview)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<TemplateSummary>, StoreError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, tag FROM templates ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TemplateSummary {
                id: row.id,
                tag: row.tag,
            })
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<TemplateRecord>, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM templates")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
