//! Docmint Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the Docmint workspace.
//!
//! # Overview
//!
//! - **Logging**: `tracing` subscriber initialisation driven by environment variables
//! - **Checksums**: content digests recorded alongside stored templates
//! - **Media types**: the content types the template pipeline accepts and produces
//!
//! # Example
//!
//! ```no_run
//! use docmint_common::logging::{init_logging, LogConfig};
//! use docmint_common::media;
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     assert!(media::is_template_type(media::DOCX));
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod logging;
pub mod media;
