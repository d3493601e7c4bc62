//! Document merge client
//!
//! Merges field data into a template via the PDF Services REST API and
//! exposes the generated PDF as a stream.
//!
//! # Protocol
//!
//! 1. Exchange the client credentials for an access token (`POST /token`)
//! 2. Register an upload asset (`POST /assets`) and `PUT` the template bytes
//! 3. Start a document generation job (`POST /operation/documentgeneration`)
//! 4. Poll the job named by the `Location` header until it is `done` or `failed`
//! 5. Stream the output asset from its download URI
//!
//! Every call is single-attempt. Polling the job status is part of step 4,
//! bounded by `MergeConfig::max_polls`.

use async_trait::async_trait;
use axum::body::Bytes;
use docmint_common::media;
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, Client, RequestBuilder, Response, Url};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, instrument, warn};

use crate::config::MergeConfig;
use crate::content::{self, ContentStream};

/// Field data merged into a template
pub type MergeFields = Map<String, Value>;

const OUTPUT_FORMAT_PDF: &str = "pdf";

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Failed to read template content: {0}")]
    Content(#[from] std::io::Error),
    #[error("Merge request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Merge service {stage} returned {status}: {body}")]
    Status {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[error("Merge service did not name the generation job")]
    MissingLocation,
    #[error("Invalid merge service URL: {0}")]
    InvalidUrl(String),
    #[error("Merge job failed: {0}")]
    JobFailed(String),
    #[error("Merge job still running after {polls} status checks")]
    Timeout { polls: u32 },
}

/// Generated document ready to be streamed to its destination
pub struct MergedDocument {
    content_type: String,
    stream: ContentStream,
}

impl MergedDocument {
    pub fn new(content_type: impl Into<String>, stream: ContentStream) -> Self {
        Self {
            content_type: content_type.into(),
            stream,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn into_stream(self) -> ContentStream {
        self.stream
    }

    /// Copy the document into `destination`, returning the bytes written
    pub async fn write_to<W>(self, destination: &mut W) -> std::io::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut stream = self.stream;
        let mut written = 0u64;
        while let Some(chunk) = stream.try_next().await? {
            destination.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        destination.flush().await?;
        Ok(written)
    }
}

impl std::fmt::Debug for MergedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedDocument")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Combines templates with field data into generated documents
#[async_trait]
pub trait DocumentMerger: Send + Sync {
    async fn merge_document(
        &self,
        template: ContentStream,
        fields: MergeFields,
    ) -> Result<MergedDocument, MergeError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetRequest<'a> {
    media_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetUpload {
    upload_uri: String,
    #[serde(rename = "assetID")]
    asset_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationRequest<'a> {
    #[serde(rename = "assetID")]
    asset_id: &'a str,
    output_format: &'a str,
    json_data_for_merge: &'a MergeFields,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
    asset: Option<JobAsset>,
    error: Option<JobError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobAsset {
    download_uri: String,
}

#[derive(Debug, Deserialize)]
struct JobError {
    code: Option<String>,
    message: Option<String>,
}

/// Client for the PDF Services document generation API.
///
/// Holds the service credentials and a pooled HTTP client; built once at
/// startup and shared by all requests. Each merge obtains its own access
/// token, so no per-call state is kept between merges.
#[derive(Clone)]
pub struct MergeClient {
    client: Client,
    config: MergeConfig,
    base_url: Url,
}

impl MergeClient {
    pub fn new(config: MergeConfig) -> Result<Self, MergeError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("docmint/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = parse_base_url(&config.api_url)?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, MergeError> {
        self.base_url
            .join(path)
            .map_err(|e| MergeError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header("X-API-Key", &self.config.client_id)
            .bearer_auth(token)
    }

    async fn access_token(&self) -> Result<String, MergeError> {
        let response = self
            .client
            .post(self.endpoint("token")?)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = ensure_success("token", response).await?.json().await?;
        Ok(token.access_token)
    }

    async fn upload_template(&self, token: &str, template: Bytes) -> Result<String, MergeError> {
        let response = self
            .authorized(self.client.post(self.endpoint("assets")?), token)
            .json(&AssetRequest {
                media_type: media::DOCX,
            })
            .send()
            .await?;
        let asset: AssetUpload = ensure_success("asset registration", response).await?.json().await?;

        let response = self
            .client
            .put(&asset.upload_uri)
            .header(header::CONTENT_TYPE, media::DOCX)
            .body(template)
            .send()
            .await?;
        ensure_success("asset upload", response).await?;

        debug!(asset_id = %asset.asset_id, "Template uploaded to merge service");
        Ok(asset.asset_id)
    }

    async fn start_job(
        &self,
        token: &str,
        asset_id: &str,
        fields: &MergeFields,
    ) -> Result<Url, MergeError> {
        let response = self
            .authorized(
                self.client.post(self.endpoint("operation/documentgeneration")?),
                token,
            )
            .json(&GenerationRequest {
                asset_id,
                output_format: OUTPUT_FORMAT_PDF,
                json_data_for_merge: fields,
            })
            .send()
            .await?;
        let response = ensure_success("document generation", response).await?;

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(MergeError::MissingLocation)?;

        self.base_url
            .join(location)
            .map_err(|e| MergeError::InvalidUrl(format!("{}: {}", location, e)))
    }

    async fn await_job(&self, token: &str, job: Url) -> Result<String, MergeError> {
        for poll in 1..=self.config.max_polls {
            let response = self
                .authorized(self.client.get(job.clone()), token)
                .send()
                .await?;
            let status: JobStatus = ensure_success("job status", response).await?.json().await?;

            match status.status.as_str() {
                "done" => {
                    return status.asset.map(|a| a.download_uri).ok_or_else(|| {
                        MergeError::JobFailed("job finished without an output asset".to_string())
                    });
                },
                "failed" => {
                    let message = status
                        .error
                        .map(|e| {
                            format!(
                                "{}: {}",
                                e.code.unwrap_or_else(|| "UNKNOWN".to_string()),
                                e.message.unwrap_or_default()
                            )
                        })
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(MergeError::JobFailed(message));
                },
                other => {
                    debug!(poll, status = %other, "Merge job pending");
                    tokio::time::sleep(self.config.poll_interval()).await;
                },
            }
        }

        Err(MergeError::Timeout {
            polls: self.config.max_polls,
        })
    }

    async fn download(&self, download_uri: &str) -> Result<MergedDocument, MergeError> {
        let response = self.client.get(download_uri).send().await?;
        let response = ensure_success("download", response).await?;

        let stream = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(MergedDocument::new(media::PDF, stream))
    }

    async fn run(
        &self,
        template: ContentStream,
        fields: MergeFields,
    ) -> Result<MergedDocument, MergeError> {
        let template = content::collect(template).await?;
        let token = self.access_token().await?;
        let asset_id = self.upload_template(&token, template).await?;
        let job = self.start_job(&token, &asset_id, &fields).await?;
        let download_uri = self.await_job(&token, job).await?;
        self.download(&download_uri).await
    }
}

#[async_trait]
impl DocumentMerger for MergeClient {
    #[instrument(skip(self, template, fields), fields(field_count = fields.len()))]
    async fn merge_document(
        &self,
        template: ContentStream,
        fields: MergeFields,
    ) -> Result<MergedDocument, MergeError> {
        match self.run(template, fields).await {
            Ok(document) => Ok(document),
            Err(e) => {
                error!(error = %e, "Document merge failed");
                Err(e)
            },
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, MergeError> {
    // A trailing slash makes relative joins append instead of replacing the last segment.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| MergeError::InvalidUrl(format!("{}: {}", raw, e)))
}

async fn ensure_success(stage: &'static str, response: Response) -> Result<Response, MergeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(stage, status = status.as_u16(), "Merge service rejected request");
    Err(MergeError::Status {
        stage,
        status: status.as_u16(),
        body,
    })
}
