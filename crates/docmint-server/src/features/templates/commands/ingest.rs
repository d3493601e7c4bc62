use axum::body::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::{PreviewRenderer, RenderError};
use crate::templates::{NewTemplate, StoreError, TemplatePatch, TemplateStore};

pub const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Debug, Clone)]
pub struct IngestTemplateCommand {
    pub original_name: String,
    pub content_type: String,
    pub content: Bytes,
}

#[derive(Debug, Clone)]
pub struct IngestTemplateResponse {
    pub tag: String,
    pub id: Uuid,
    pub preview_image: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestTemplateError {
    #[error("Multipart field 'template' is required")]
    MissingFile,
    #[error("Filename is required and cannot be empty")]
    FilenameRequired,
    #[error("Filename must not exceed 255 characters")]
    FilenameLength,
    #[error("Content is required and cannot be empty")]
    ContentRequired,
    #[error("Unsupported content type '{0}'")]
    UnsupportedContentType(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Preview rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("Template '{0}' disappeared before its preview was attached")]
    RecordVanished(Uuid),
}

impl IngestTemplateCommand {
    pub fn validate(&self) -> Result<(), IngestTemplateError> {
        if self.original_name.trim().is_empty() {
            return Err(IngestTemplateError::FilenameRequired);
        }
        if self.original_name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(IngestTemplateError::FilenameLength);
        }
        if self.content.is_empty() {
            return Err(IngestTemplateError::ContentRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(store, renderer, command), fields(name = %command.original_name))]
pub async fn handle(
    store: &dyn TemplateStore,
    renderer: &dyn PreviewRenderer,
    command: IngestTemplateCommand,
) -> Result<IngestTemplateResponse, IngestTemplateError> {
    command.validate()?;

    let content_type = command.content_type.clone();
    let record = store
        .store(NewTemplate {
            original_name: command.original_name,
            content_type: command.content_type,
            content: command.content,
        })
        .await?
        .ok_or(IngestTemplateError::UnsupportedContentType(content_type))?;

    let preview_image = match attach_preview(store, renderer, record.id).await {
        Ok(image) => image,
        Err(e) => {
            warn!(template_id = %record.id, error = %e, "Template stored without a preview");
            return Err(e);
        },
    };

    info!(template_id = %record.id, tag = %record.tag, "Template ingested");

    Ok(IngestTemplateResponse {
        tag: record.tag,
        id: record.id,
        preview_image,
    })
}

async fn attach_preview(
    store: &dyn TemplateStore,
    renderer: &dyn PreviewRenderer,
    id: Uuid,
) -> Result<Bytes, IngestTemplateError> {
    let content = store.open_read(id).await.map_err(|e| match e {
        StoreError::NotFound(_) => IngestTemplateError::RecordVanished(id),
        other => other.into(),
    })?;
    let image = renderer.render_preview(content).await?;

    store
        .update_fields(id, TemplatePatch::preview_image(image))
        .await?
        .and_then(|record| record.preview_image)
        .ok_or(IngestTemplateError::RecordVanished(id))
}
