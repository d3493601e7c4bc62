//! Shared fixtures for router-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Request, Response},
    Router,
};
use docmint_server::{
    api,
    clients::{DocumentMerger, MergeError, MergeFields, MergedDocument, PreviewRenderer, RenderError},
    config::Config,
    content::{self, ContentStream},
    features::FeatureState,
    templates::InMemoryTemplateStore,
};
use docmint_common::media;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const PREVIEW_JPEG: &[u8] = b"\xFF\xD8\xFF\xE0preview";
pub const MERGED_PDF: &[u8] = b"%PDF-1.7\nmerged\n%%EOF";
pub const BOUNDARY: &str = "docmint-test-boundary";

/// Renderer returning a fixed JPEG, or a service error when `fail` is set
#[derive(Default)]
pub struct StubRenderer {
    pub fail: bool,
}

#[async_trait]
impl PreviewRenderer for StubRenderer {
    async fn render_preview(&self, document: ContentStream) -> Result<Bytes, RenderError> {
        content::collect(document).await?;
        if self.fail {
            return Err(RenderError::Status {
                status: 503,
                body: "render service down".to_string(),
            });
        }
        Ok(Bytes::from_static(PREVIEW_JPEG))
    }
}

/// Merger recording the field data of every call; fails each merge when `fail` is set
#[derive(Default)]
pub struct StubMerger {
    pub calls: Mutex<Vec<MergeFields>>,
    pub fail: bool,
}

impl StubMerger {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentMerger for StubMerger {
    async fn merge_document(
        &self,
        template: ContentStream,
        fields: MergeFields,
    ) -> Result<MergedDocument, MergeError> {
        content::collect(template).await?;
        self.calls.lock().unwrap().push(fields);
        if self.fail {
            return Err(MergeError::MissingLocation);
        }
        Ok(MergedDocument::new(
            media::PDF,
            content::from_bytes(Bytes::from_static(MERGED_PDF)),
        ))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryTemplateStore>,
    pub merger: Arc<StubMerger>,
}

pub fn test_app() -> TestApp {
    build_app(StubRenderer::default())
}

pub fn build_app(renderer: StubRenderer) -> TestApp {
    build_app_with(renderer, StubMerger::default())
}

pub fn build_app_with(renderer: StubRenderer, merger: StubMerger) -> TestApp {
    let store = Arc::new(InMemoryTemplateStore::new());
    let merger = Arc::new(merger);

    let state = FeatureState {
        store: store.clone(),
        renderer: Arc::new(renderer),
        merger: merger.clone(),
    };

    TestApp {
        router: api::create_router(state, &Config::default()),
        store,
        merger,
    }
}

/// Build a single-file multipart upload request
pub fn upload_request(field: &str, filename: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn docx_upload(filename: &str) -> Request<Body> {
    upload_request("template", filename, media::DOCX, b"PK\x03\x04template body")
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
