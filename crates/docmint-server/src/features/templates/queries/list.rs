use serde::Serialize;
use uuid::Uuid;

use crate::templates::{StoreError, TemplateStore};

#[derive(Debug, Clone, Default)]
pub struct ListTemplatesQuery;

/// Catalog entry as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListItem {
    /// The generated tag
    pub template_name: String,
    pub template_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum ListTemplatesError {
    #[error("No files found")]
    Empty,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store, _query))]
pub async fn handle(
    store: &dyn TemplateStore,
    _query: ListTemplatesQuery,
) -> Result<Vec<TemplateListItem>, ListTemplatesError> {
    let templates = store.list().await?;
    if templates.is_empty() {
        return Err(ListTemplatesError::Empty);
    }

    Ok(templates
        .into_iter()
        .map(|t| TemplateListItem {
            template_name: t.tag,
            template_id: t.id,
        })
        .collect())
}
