//! Content type selection by file extension

/// Content type served for an object name
///
/// Only html, css and js get dedicated types; everything else is served
/// as plain text.
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        _ => "text/plain",
    }
}
