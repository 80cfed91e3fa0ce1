//! API layer
//!
//! HTTP handlers for:
//! - File serving (`/`, `/trans`, `/public`)
//! - Upload form and password check (`/upload`, `/validate`)
//! - Metrics (Prometheus)

mod client;
mod files;
pub mod metrics;
pub mod pages;
mod upload;

pub use client::{ClientId, UNKNOWN_CLIENT};
pub use files::{ensure_html_suffix, files_router, is_truthy};
pub use metrics::metrics_router;
pub use upload::upload_router;
