//! Server-wide error type and its HTTP mapping
//!
//! Operation errors keep their own variants; they are folded into [`AppError`]
//! at the route boundary. Validation and lookup failures surface their message
//! to the caller, while external-service and internal failures are logged and
//! answered with a generic payload.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::features::documents::GenerateDocumentError;
use crate::features::templates::{GetPreviewError, IngestTemplateError, ListTemplatesError};
use crate::templates::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{service} failed: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl From<IngestTemplateError> for AppError {
    fn from(err: IngestTemplateError) -> Self {
        match err {
            IngestTemplateError::MissingFile
            | IngestTemplateError::FilenameRequired
            | IngestTemplateError::FilenameLength
            | IngestTemplateError::ContentRequired => AppError::Validation(err.to_string()),
            IngestTemplateError::UnsupportedContentType(_) => {
                AppError::UnsupportedMediaType(err.to_string())
            },
            IngestTemplateError::Store(e) => e.into(),
            IngestTemplateError::Render(e) => AppError::ExternalService {
                service: "Preview rendering",
                message: e.to_string(),
            },
            IngestTemplateError::RecordVanished(_) => {
                AppError::InternalConsistency(err.to_string())
            },
        }
    }
}

impl From<ListTemplatesError> for AppError {
    fn from(err: ListTemplatesError) -> Self {
        match err {
            ListTemplatesError::Empty => AppError::NotFound(err.to_string()),
            ListTemplatesError::Store(e) => e.into(),
        }
    }
}

impl From<GetPreviewError> for AppError {
    fn from(err: GetPreviewError) -> Self {
        match err {
            GetPreviewError::InvalidId(_) => AppError::Validation(err.to_string()),
            GetPreviewError::NotFound(_) | GetPreviewError::NoPreview(_) => {
                AppError::NotFound(err.to_string())
            },
            GetPreviewError::Store(e) => e.into(),
        }
    }
}

impl From<GenerateDocumentError> for AppError {
    fn from(err: GenerateDocumentError) -> Self {
        match err {
            GenerateDocumentError::TemplateIdRequired
            | GenerateDocumentError::InvalidTemplateId(_) => AppError::Validation(err.to_string()),
            GenerateDocumentError::NotFound(_) => AppError::NotFound(err.to_string()),
            GenerateDocumentError::Store(e) => e.into(),
            GenerateDocumentError::Merge(e) => AppError::ExternalService {
                service: "Document merge",
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
            AppError::UnsupportedMediaType(message) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_CONTENT_TYPE", message)
            },
            AppError::Multipart(e) => (e.status(), "INVALID_UPLOAD", e.body_text()),
            AppError::ExternalService { service, message } => {
                tracing::error!(service, error = %message, "External service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "EXTERNAL_SERVICE_ERROR",
                    format!("{} is unavailable", service),
                )
            },
            AppError::InternalConsistency(message) => {
                tracing::error!("Internal consistency error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            },
            AppError::Store(e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            },
        };

        ErrorResponse::new(code, message).into_response_with(status)
    }
}

/// Alias for Result with AppError
pub type ApiResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::RenderError;
    use uuid::Uuid;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        assert_eq!(status_of(IngestTemplateError::MissingFile), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(GenerateDocumentError::TemplateIdRequired),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_wrong_content_type_maps_to_415() {
        assert_eq!(
            status_of(IngestTemplateError::UnsupportedContentType("text/plain".to_string())),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_not_found_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(status_of(StoreError::NotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(GetPreviewError::NoPreview(id)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(GenerateDocumentError::NotFound(id)), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_external_and_internal_are_server_errors() {
        assert_eq!(
            status_of(IngestTemplateError::Render(RenderError::EmptyImage)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(IngestTemplateError::RecordVanished(Uuid::new_v4())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
