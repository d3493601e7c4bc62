//! Preview rendering client
//!
//! Converts a template document into a JPEG of its first document part by
//! posting it to a document build endpoint as `multipart/form-data` with two
//! parts: `instructions` (JSON) and `document` (the file).

use async_trait::async_trait;
use axum::body::Bytes;
use docmint_common::media;
use reqwest::{multipart, Client};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::RenderConfig;
use crate::content::{self, ContentStream};

/// Name of the multipart part carrying the document, referenced by the instructions.
const DOCUMENT_PART: &str = "document";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to read template content: {0}")]
    Content(#[from] std::io::Error),
    #[error("Render request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Render service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Render service returned an empty image")]
    EmptyImage,
    #[error("Failed to encode render instructions: {0}")]
    Instructions(#[from] serde_json::Error),
}

/// Produces preview images for template documents
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render_preview(&self, document: ContentStream) -> Result<Bytes, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderInstructions {
    pub parts: Vec<InstructionPart>,
    pub output: ImageOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionPart {
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOutput {
    #[serde(rename = "type")]
    pub kind: String,
    pub format: String,
    pub quality: u8,
    pub dpi: u32,
}

impl RenderInstructions {
    /// Single document part rendered as a JPEG image
    pub fn jpeg_preview(quality: u8, dpi: u32) -> Self {
        Self {
            parts: vec![InstructionPart {
                file: DOCUMENT_PART.to_string(),
            }],
            output: ImageOutput {
                kind: "image".to_string(),
                format: "jpg".to_string(),
                quality,
                dpi,
            },
        }
    }
}

/// HTTP client for the document build endpoint
#[derive(Clone)]
pub struct RenderClient {
    client: Client,
    config: RenderConfig,
    instructions: String,
}

impl RenderClient {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("docmint/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let instructions = serde_json::to_string(&RenderInstructions::jpeg_preview(
            config.quality,
            config.dpi,
        ))?;

        Ok(Self {
            client,
            config,
            instructions,
        })
    }

    async fn request_image(&self, document: Bytes) -> Result<Bytes, RenderError> {
        let document_part = multipart::Part::stream(reqwest::Body::from(document))
            .file_name("template.docx")
            .mime_str(media::DOCX)?;

        let form = multipart::Form::new()
            .text("instructions", self.instructions.clone())
            .part(DOCUMENT_PART, document_part);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let image = response.bytes().await?;
        if image.is_empty() {
            return Err(RenderError::EmptyImage);
        }

        Ok(image)
    }
}

#[async_trait]
impl PreviewRenderer for RenderClient {
    #[instrument(skip(self, document), fields(url = %self.config.api_url))]
    async fn render_preview(&self, document: ContentStream) -> Result<Bytes, RenderError> {
        let document = content::collect(document).await?;
        debug!(size = document.len(), "Requesting template preview");

        match self.request_image(document).await {
            Ok(image) => {
                debug!(size = image.len(), "Preview rendered");
                Ok(image)
            },
            Err(e) => {
                error!(error = %e, "Preview rendering failed");
                Err(e)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_wire_shape() {
        let json = serde_json::to_value(RenderInstructions::jpeg_preview(70, 250)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "parts": [{ "file": "document" }],
                "output": { "type": "image", "format": "jpg", "quality": 70, "dpi": 250 }
            })
        );
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = RenderConfig::new("http://localhost:1/build", "key");
        let client = RenderClient::new(config).unwrap();
        assert!(client.instructions.contains("\"dpi\":250"));
    }
}
