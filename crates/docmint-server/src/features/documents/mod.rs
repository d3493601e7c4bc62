//! Document generation from stored templates

pub mod commands;
pub mod routes;

pub use commands::{GenerateDocumentCommand, GenerateDocumentError, GenerateDocumentResponse};

pub use routes::documents_routes;
