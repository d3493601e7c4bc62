pub mod list;
pub mod preview;

pub use list::{ListTemplatesError, ListTemplatesQuery, TemplateListItem};
pub use preview::{GetPreviewError, GetPreviewQuery};
