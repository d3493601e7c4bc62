use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::GenerateDocumentCommand;
use crate::api::no_route;
use crate::clients::MergeFields;
use crate::error::{ApiResult, AppError};
use crate::features::FeatureState;

pub fn documents_routes() -> Router<FeatureState> {
    Router::new().route("/resume", post(generate_document).fallback(no_route))
}

#[tracing::instrument(skip(state, body))]
async fn generate_document(
    State(state): State<FeatureState>,
    body: Result<Json<MergeFields>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(fields) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let response = super::commands::generate::handle(
        state.store.as_ref(),
        state.merger.as_ref(),
        GenerateDocumentCommand::new(fields),
    )
    .await?;

    let content_type = response.document.content_type().to_string();
    let disposition = format!("attachment; filename=\"{}\"", response.file_name);
    let body = Body::from_stream(response.document.into_stream());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
