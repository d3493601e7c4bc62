//! Docmint Server Library
//!
//! HTTP service that stores word-processing templates, renders a preview image
//! for each upload and merges field data into stored templates to produce PDFs.
//!
//! # Overview
//!
//! - **Template store**: records in PostgreSQL, document content in an
//!   S3-compatible bucket ([`templates::PgTemplateStore`]); an in-memory
//!   implementation backs the tests
//! - **Preview rendering**: documents are posted to a document build service
//!   that returns a JPEG ([`clients::RenderClient`])
//! - **Document merge**: templates and field data go to a document generation
//!   service whose PDF output is streamed back to the caller
//!   ([`clients::MergeClient`])
//!
//! # Architecture
//!
//! Features are vertical slices under [`features`], each with commands,
//! queries and routes. The store and both service clients sit behind traits
//! and are handed to routes in [`features::FeatureState`], built once at
//! startup.

pub mod api;
pub mod clients;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod storage;
pub mod templates;

pub use error::{ApiResult, AppError};
