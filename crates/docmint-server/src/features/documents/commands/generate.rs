use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::clients::{DocumentMerger, MergeError, MergeFields, MergedDocument};
use crate::templates::{StoreError, TemplateStore};

/// Request field naming the template; every other field is merge data.
pub const TEMPLATE_ID_FIELD: &str = "templateId";

const FILE_NAME_PREFIX: &str = "resume";
const FILE_NAME_TIMESTAMP: &str = "%Y-%m-%dT%H-%M-%S";

/// Generation request: the template id plus its merge fields
#[derive(Debug, Clone)]
pub struct GenerateDocumentCommand {
    pub fields: MergeFields,
}

pub struct GenerateDocumentResponse {
    pub file_name: String,
    pub document: MergedDocument,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateDocumentError {
    #[error("templateId is required")]
    TemplateIdRequired,
    #[error("'{0}' is not a valid template id")]
    InvalidTemplateId(String),
    #[error("Template '{0}' not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Store(StoreError),
    #[error("Document merge failed: {0}")]
    Merge(#[from] MergeError),
}

impl From<StoreError> for GenerateDocumentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl GenerateDocumentCommand {
    pub fn new(fields: MergeFields) -> Self {
        Self { fields }
    }

    /// Split the request into the template id and the remaining merge fields
    pub fn into_parts(mut self) -> Result<(Uuid, MergeFields), GenerateDocumentError> {
        let id = match self.fields.remove(TEMPLATE_ID_FIELD) {
            None | Some(Value::Null) => return Err(GenerateDocumentError::TemplateIdRequired),
            Some(Value::String(raw)) => Uuid::parse_str(raw.trim())
                .map_err(|_| GenerateDocumentError::InvalidTemplateId(raw))?,
            Some(other) => return Err(GenerateDocumentError::InvalidTemplateId(other.to_string())),
        };
        Ok((id, self.fields))
    }
}

/// Attachment name for a document generated at `now`
pub fn output_file_name(now: DateTime<Local>) -> String {
    format!("{}{}.pdf", FILE_NAME_PREFIX, now.format(FILE_NAME_TIMESTAMP))
}

#[tracing::instrument(skip(store, merger, command))]
pub async fn handle(
    store: &dyn TemplateStore,
    merger: &dyn DocumentMerger,
    command: GenerateDocumentCommand,
) -> Result<GenerateDocumentResponse, GenerateDocumentError> {
    let (id, fields) = command.into_parts()?;

    let template = store.open_read(id).await?;
    let document = merger.merge_document(template, fields).await?;
    let file_name = output_file_name(Local::now());

    info!(template_id = %id, file_name = %file_name, "Document generated");

    Ok(GenerateDocumentResponse {
        file_name,
        document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{self, ContentStream};
    use crate::templates::{InMemoryTemplateStore, NewTemplate};
    use async_trait::async_trait;
    use axum::body::Bytes;
    use chrono::TimeZone;
    use docmint_common::media;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMerger {
        calls: Mutex<Vec<MergeFields>>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentMerger for RecordingMerger {
        async fn merge_document(
            &self,
            template: ContentStream,
            fields: MergeFields,
        ) -> Result<MergedDocument, MergeError> {
            let template = content::collect(template).await?;
            self.calls.lock().unwrap().push(fields);
            if self.fail {
                return Err(MergeError::JobFailed("BAD_TEMPLATE: Unbalanced tag".to_string()));
            }
            let mut pdf = b"%PDF:".to_vec();
            pdf.extend_from_slice(&template);
            Ok(MergedDocument::new(media::PDF, content::from_bytes(Bytes::from(pdf))))
        }
    }

    fn fields(value: Value) -> MergeFields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_into_parts_removes_template_id() {
        let id = Uuid::new_v4();
        let cmd = GenerateDocumentCommand::new(fields(json!({ "templateId": id, "name": "Alice" })));

        let (parsed, rest) = cmd.into_parts().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(Value::Object(rest), json!({ "name": "Alice" }));
    }

    #[test]
    fn test_into_parts_requires_template_id() {
        let cmd = GenerateDocumentCommand::new(fields(json!({ "name": "Alice" })));
        assert!(matches!(cmd.into_parts(), Err(GenerateDocumentError::TemplateIdRequired)));
    }

    #[test]
    fn test_into_parts_rejects_tags_and_numbers() {
        let tag = GenerateDocumentCommand::new(fields(json!({ "templateId": "template0001" })));
        assert!(matches!(tag.into_parts(), Err(GenerateDocumentError::InvalidTemplateId(_))));

        let number = GenerateDocumentCommand::new(fields(json!({ "templateId": 7 })));
        assert!(matches!(number.into_parts(), Err(GenerateDocumentError::InvalidTemplateId(_))));
    }

    #[test]
    fn test_output_file_name_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(output_file_name(now), "resume2024-03-09T14-05-07.pdf");
    }

    async fn stored_template(store: &InMemoryTemplateStore) -> Uuid {
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

    #[tokio::test]
    async fn test_generate_merges_remaining_fields() {
        let store = InMemoryTemplateStore::new();
        let id = stored_template(&store).await;
        let merger = RecordingMerger::default();

        let cmd = GenerateDocumentCommand::new(fields(json!({
            "templateId": id.to_string(),
            "name": "Alice"
        })));
        let response = handle(&store, &merger, cmd).await.unwrap();

        assert!(response.file_name.starts_with("resume"));
        assert!(response.file_name.ends_with(".pdf"));
        let pdf = content::collect(response.document.into_stream()).await.unwrap();
        assert_eq!(&pdf[..], b"%PDF:PK");

        let calls = merger.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(Value::Object(calls[0].clone()), json!({ "name": "Alice" }));
    }

    #[tokio::test]
    async fn test_unknown_template_skips_merge() {
        let store = InMemoryTemplateStore::new();
        let merger = RecordingMerger::default();
        let id = Uuid::new_v4();

        let cmd = GenerateDocumentCommand::new(fields(json!({ "templateId": id.to_string() })));
        let result = handle(&store, &merger, cmd).await;

        assert!(matches!(result, Err(GenerateDocumentError::NotFound(missing)) if missing == id));
        assert!(merger.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_failure_is_reported() {
        let store = InMemoryTemplateStore::new();
        let id = stored_template(&store).await;
        let merger = RecordingMerger {
            fail: true,
            ..Default::default()
        };

        let cmd = GenerateDocumentCommand::new(fields(json!({ "templateId": id.to_string() })));
        let result = handle(&store, &merger, cmd).await;

        assert!(matches!(
            result,
            Err(GenerateDocumentError::Merge(MergeError::JobFailed(_)))
        ));
        assert_eq!(merger.calls.lock().unwrap().len(), 1);
    }
}
