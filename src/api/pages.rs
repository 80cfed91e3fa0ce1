//! Fixed HTML pages served by the gateway

/// Returned for missing parameters and absent objects
pub const NOT_FOUND_HTML: &str = include_str!("../../public/404.html");

/// Upload form, also re-rendered when an upload is rejected
pub const UPLOAD_HTML: &str = include_str!("../../public/upload.html");
