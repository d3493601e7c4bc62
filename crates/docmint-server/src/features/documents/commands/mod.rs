pub mod generate;

pub use generate::{GenerateDocumentCommand, GenerateDocumentError, GenerateDocumentResponse};
