pub mod ingest;

pub use ingest::{IngestTemplateCommand, IngestTemplateError, IngestTemplateResponse};
