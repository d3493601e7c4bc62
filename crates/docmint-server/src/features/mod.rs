//! Feature slices implementing the docmint API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes:
//!
//! - **templates**: upload with preview rendering, the catalog and preview images
//! - **documents**: PDF generation from a stored template and field data
//!
//! Handlers are plain async functions taking the capabilities they need and
//! returning an operation-specific error enum; routes translate those errors
//! into HTTP responses through [`crate::error::AppError`].

pub mod documents;
pub mod templates;

use std::sync::Arc;

use axum::Router;

use crate::clients::{DocumentMerger, PreviewRenderer};
use crate::templates::TemplateStore;

/// Shared state for all feature routes
///
/// The store and both service clients are built once at startup and shared
/// read-only by every request.
#[derive(Clone)]
pub struct FeatureState {
    pub store: Arc<dyn TemplateStore>,
    pub renderer: Arc<dyn PreviewRenderer>,
    pub merger: Arc<dyn DocumentMerger>,
}

/// Router with every feature's routes mounted at the root
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(templates::templates_routes())
        .merge(documents::documents_routes())
        .with_state(state)
}
