use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docmint_common::media;
use serde::Serialize;
use uuid::Uuid;

use super::{
    commands::{IngestTemplateCommand, IngestTemplateError},
    queries::{GetPreviewQuery, ListTemplatesError, ListTemplatesQuery},
};
use crate::api::{no_route, response::MessageResponse};
use crate::error::{AppError, ApiResult};
use crate::features::FeatureState;

/// Multipart field carrying the uploaded template
pub const TEMPLATE_FIELD: &str = "template";

pub fn templates_routes() -> Router<FeatureState> {
    Router::new()
        .route("/upload", post(upload_template).fallback(no_route))
        .route("/templates", get(list_templates).fallback(no_route))
        .route("/image/:id", get(get_preview).fallback(no_route))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadTemplateResponse {
    template_id: String,
    id: Uuid,
    image_data: String,
}

#[tracing::instrument(skip(state, multipart))]
async fn upload_template(
    State(state): State<FeatureState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let mut command: Option<IngestTemplateCommand> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(TEMPLATE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or(media::OCTET_STREAM)
            .to_string();
        let content = field.bytes().await?;

        command = Some(IngestTemplateCommand {
            original_name,
            content_type,
            content,
        });
    }

    let command = command.ok_or(IngestTemplateError::MissingFile)?;
    let response =
        super::commands::ingest::handle(state.store.as_ref(), state.renderer.as_ref(), command)
            .await?;

    tracing::info!(
        template_id = %response.id,
        tag = %response.tag,
        preview_size = response.preview_image.len(),
        "Template uploaded via API"
    );

    Ok(Json(UploadTemplateResponse {
        template_id: response.tag,
        id: response.id,
        image_data: STANDARD.encode(&response.preview_image),
    })
    .into_response())
}

#[tracing::instrument(skip(state))]
async fn list_templates(State(state): State<FeatureState>) -> ApiResult<Response> {
    match super::queries::list::handle(state.store.as_ref(), ListTemplatesQuery).await {
        Ok(items) => Ok(Json(items).into_response()),
        Err(ListTemplatesError::Empty) => Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("No files found")),
        )
            .into_response()),
        Err(e) => Err(AppError::from(e)),
    }
}

#[tracing::instrument(skip(state))]
async fn get_preview(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let image = super::queries::preview::handle(state.store.as_ref(), GetPreviewQuery { id }).await?;

    Ok(([(header::CONTENT_TYPE, media::JPEG)], image).into_response())
}
