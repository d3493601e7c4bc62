//! Clients for the external document services

pub mod merge;
pub mod render;

pub use merge::{DocumentMerger, MergeClient, MergeError, MergeFields, MergedDocument};
pub use render::{PreviewRenderer, RenderClient, RenderError};
