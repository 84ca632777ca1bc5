//! MIME type module
//!
//! Content-Type lookup by extension, and the text/binary classification used
//! when a response body is put back into the envelope.

use std::path::Path;

/// Structured-text types carried as UTF-8 even though they are not `text/*`
const EXTRA_PLAIN_TEXT: &[&str] = &[
    "application/javascript",
    "application/json",
    "application/xml",
    "application/rss+xml",
    "application/atom+xml",
    "application/xhtml+xml",
];

/// Get MIME Content-Type based on file extension
///
/// # Examples
/// ```
/// use whisk_serve::http::mime::get_content_type;
/// assert_eq!(get_content_type("/index.html"), "text/html");
/// assert_eq!(get_content_type("/logo.png"), "image/png");
/// assert_eq!(get_content_type("/LICENSE"), "application/octet-stream");
/// ```
pub fn get_content_type(path: &str) -> String {
    mime_guess::from_path(Path::new(path))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Strip parameters from a Content-Type value (`text/html; charset=utf-8` -> `text/html`)
pub fn essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

/// Whether a body with this Content-Type is transported as UTF-8 text
pub fn is_textual(content_type: Option<&str>) -> bool {
    let base = content_type.map(essence).unwrap_or_default();
    base.starts_with("text/") || EXTRA_PLAIN_TEXT.contains(&base)
}
