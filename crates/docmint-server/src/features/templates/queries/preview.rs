use axum::body::Bytes;
use uuid::Uuid;

use crate::templates::{StoreError, TemplateStore};

#[derive(Debug, Clone)]
pub struct GetPreviewQuery {
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetPreviewError {
    #[error("'{0}' is not a valid template id")]
    InvalidId(String),
    #[error("Template '{0}' not found")]
    NotFound(Uuid),
    #[error("Template '{0}' has no preview image")]
    NoPreview(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GetPreviewQuery {
    pub fn validate(&self) -> Result<Uuid, GetPreviewError> {
        Uuid::parse_str(self.id.trim()).map_err(|_| GetPreviewError::InvalidId(self.id.clone()))
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn TemplateStore, query: GetPreviewQuery) -> Result<Bytes, GetPreviewError> {
    let id = query.validate()?;

    let record = store.get(id).await?.ok_or(GetPreviewError::NotFound(id))?;

    record
        .preview_image
        .filter(|image| !image.is_empty())
        .ok_or(GetPreviewError::NoPreview(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{InMemoryTemplateStore, NewTemplate, TemplatePatch};
    use docmint_common::media;

    async fn stored(store: &InMemoryTemplateStore) -> Uuid {
        store
            .store(NewTemplate {
                original_name: "cv.docx".to_string(),
                content_type: media::DOCX.to_string(),
                content: Bytes::from_static(b"PK"),
            })
            .await
            .unwrap()
            .unwrap()
            .id
    }

    #[test]
    fn test_invalid_id() {
        let query = GetPreviewQuery {
            id: "template0001".to_string(),
        };
        assert!(matches!(query.validate(), Err(GetPreviewError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_missing_record() {
        let store = InMemoryTemplateStore::new();
        let query = GetPreviewQuery {
            id: Uuid::new_v4().to_string(),
        };
        assert!(matches!(handle(&store, query).await, Err(GetPreviewError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_no_preview_before_attachment() {
        let store = InMemoryTemplateStore::new();
        let id = stored(&store).await;

        let query = GetPreviewQuery { id: id.to_string() };
        assert!(matches!(handle(&store, query).await, Err(GetPreviewError::NoPreview(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_returns_attached_preview() {
        let store = InMemoryTemplateStore::new();
        let id = stored(&store).await;
        store
            .update_fields(id, TemplatePatch::preview_image(Bytes::from_static(b"\xFF\xD8")))
            .await
            .unwrap();

        let image = handle(&store, GetPreviewQuery { id: id.to_string() }).await.unwrap();
        assert_eq!(&image[..], b"\xFF\xD8");
    }
}
