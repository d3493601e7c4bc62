//! Template upload, catalog and preview images

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{IngestTemplateCommand, IngestTemplateError, IngestTemplateResponse};

pub use queries::{
    GetPreviewError, GetPreviewQuery, ListTemplatesError, ListTemplatesQuery, TemplateListItem,
};

pub use routes::templates_routes;
