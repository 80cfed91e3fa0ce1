//! Object store backends
//!
//! Handles:
//! - S3-compatible remote buckets (MinIO, R2, AWS)
//! - An in-process store for local runs and tests

mod memory;
mod s3;

use async_trait::async_trait;

use crate::error::AppError;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Byte storage addressed by (bucket, name)
///
/// Implementations read objects to completion before returning; callers
/// never observe partial data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `name`, replacing any existing object
    async fn put(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError>;

    /// Read a whole object
    ///
    /// # Returns
    /// `Ok(None)` when the store reports the object (or bucket) absent
    async fn get(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Remove an object. Removing an absent object is not an error.
    async fn delete(&self, bucket: &str, name: &str) -> Result<(), AppError>;

    /// Create the bucket unless it already exists
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), AppError>;
}

pub(crate) fn build_s3_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(connector)
}
