//! Media types handled by the template pipeline

use mime::Mime;

/// Word-processing document type; the only content type accepted for templates.
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Content type of rendered template previews.
pub const JPEG: &str = "image/jpeg";

/// Content type of generated documents.
pub const PDF: &str = "application/pdf";

/// Assumed when an upload declares no content type.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returns true when a declared content type names the template document type.
///
/// Parameters (`; charset=...`) and letter case are ignored; anything that
/// does not parse as a media type is rejected.
pub fn is_template_type(content_type: &str) -> bool {
    match content_type.trim().parse::<Mime>() {
        Ok(parsed) => parsed.essence_str().eq_ignore_ascii_case(DOCX),
        Err(_) => false,
    }
}

/// Returns true for any `image/*` content type.
pub fn is_image_type(content_type: &str) -> bool {
    content_type
        .trim()
        .parse::<Mime>()
        .map(|parsed| parsed.type_() == mime::IMAGE)
        .unwrap_or(false)
}
