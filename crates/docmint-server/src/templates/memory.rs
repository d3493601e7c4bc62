//! Process-local template store

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use docmint_common::{checksum::sha256_hex, media};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    format_tag, NewTemplate, StoreError, TemplatePatch, TemplateRecord, TemplateStore,
    TemplateSummary,
};
use crate::content::{self, ContentStream};

#[derive(Debug, Clone)]
struct StoredTemplate {
    record: TemplateRecord,
    content: Bytes,
}

/// Keeps records and content in memory for the life of the process.
///
/// Tag derivation reads the count and inserts under separate lock
/// acquisitions, matching the durable store's count-then-format behaviour.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<Vec<StoredTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    #[instrument(skip(self, template), fields(name = %template.original_name))]
    async fn store(&self, template: NewTemplate) -> Result<Option<TemplateRecord>, StoreError> {
        if !media::is_template_type(&template.content_type) {
            debug!(content_type = %template.content_type, "Skipping store of non-template content");
            return Ok(None);
        }

        let tag = format_tag(self.count().await?);
        tokio::task::yield_now().await;

        let record = TemplateRecord {
            id: Uuid::new_v4(),
            original_name: template.original_name,
            tag,
            content_type: template.content_type,
            size: template.content.len() as i64,
            checksum: sha256_hex(&template.content),
            preview_image: None,
            created_at: Utc::now(),
        };

        self.templates.write().await.push(StoredTemplate {
            record: record.clone(),
            content: template.content,
        });

        Ok(Some(record))
    }

    async fn open_read(&self, id: Uuid) -> Result<ContentStream, StoreError> {
        let templates = self.templates.read().await;
        let stored = templates
            .iter()
            .find(|t| t.record.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(content::from_bytes(stored.content.clone()))
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: TemplatePatch,
    ) -> Result<Option<TemplateRecord>, StoreError> {
        let mut templates = self.templates.write().await;
        let Some(stored) = templates.iter_mut().find(|t| t.record.id == id) else {
            return Ok(None);
        };

        if let Some(image) = patch.preview_image {
            stored.record.preview_image = Some(image);
        }

        Ok(Some(stored.record.clone()))
    }

    async fn list(&self) -> Result<Vec<TemplateSummary>, StoreError> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .map(|t| TemplateSummary {
                id: t.record.id,
                tag: t.record.tag.clone(),
            })
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<TemplateRecord>, StoreError> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .find(|t| t.record.id == id)
            .map(|t| t.record.clone()))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.templates.read().await.len() as i64)
    }
}
