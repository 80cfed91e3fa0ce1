//! Object gateway
//!
//! Adapter between the HTTP handlers and an [`ObjectStore`]. Uploads
//! return the public URL the object is served under; downloads collapse
//! "not found" and store failures into a single absent outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::content_type_for;
use crate::config::{AppConfig, ServerConfig};
use crate::error::AppError;
use crate::metrics::{
    BYTES_SERVED, BYTES_UPLOADED, STORE_OPERATION_DURATION_SECONDS, STORE_OPERATIONS_TOTAL,
    UPLOADS_TOTAL,
};
use crate::storage::ObjectStore;

/// Longest key accepted by S3-compatible stores, in bytes
const MAX_NAME_BYTES: usize = 1024;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub name: String,
    /// Public URL served by this gateway's `/public/:file` route
    pub url: String,
}

/// Object store adapter
pub struct ObjectGateway {
    store: Arc<dyn ObjectStore>,
    /// Bucket used for uploads and `/public` downloads
    bucket: String,
    server: ServerConfig,
    http_client: reqwest::Client,
    /// Upper bound on a single store call
    timeout: Duration,
}

impl ObjectGateway {
    /// Create new gateway
    ///
    /// # Arguments
    /// * `store` - Backend holding the objects
    /// * `config` - Application configuration (bucket, public domain, timeout)
    /// * `http_client` - Client used by [`Self::upload_from_url`]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        config: &AppConfig,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            store,
            bucket: config.storage.bucket.clone(),
            server: config.server.clone(),
            http_client,
            timeout: Duration::from_secs(config.storage.timeout_seconds),
        }
    }

    /// Override the per-call store timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bucket used when a caller names none
    pub fn default_bucket(&self) -> &str {
        &self.bucket
    }

    /// Run a store call under the timeout and record its outcome
    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let timer = STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&[operation])
            .start_timer();

        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(operation)),
        };

        timer.observe_duration();
        let outcome = if result.is_ok() { "ok" } else { "error" };
        STORE_OPERATIONS_TOTAL
            .with_label_values(&[operation, outcome])
            .inc();

        result
    }

    /// Write `data` under `name` in `bucket`
    ///
    /// # Returns
    /// The name and the public URL `<protocol>://<domain>/public/<name>`
    ///
    /// # Errors
    /// Invalid names, store failures and timeouts are propagated
    pub async fn upload_bytes(
        &self,
        name: &str,
        data: Vec<u8>,
        bucket: &str,
    ) -> Result<UploadedObject, AppError> {
        validate_object_name(name)?;

        let size = data.len();
        let content_type = content_type_for(name);
        self.timed("put", self.store.put(bucket, name, data, content_type))
            .await?;

        UPLOADS_TOTAL.inc();
        BYTES_UPLOADED.inc_by(size as f64);
        tracing::info!(name = %name, bucket = %bucket, bytes = size, "Object uploaded");

        Ok(UploadedObject {
            name: name.to_string(),
            url: self.server.public_url(name),
        })
    }

    /// Fetch `source_url` fully into memory, then upload it to the default bucket
    ///
    /// # Errors
    /// Non-http(s) URLs and non-2xx responses fail with [`AppError::Fetch`],
    /// transport errors with [`AppError::HttpClient`]; upload errors as in
    /// [`Self::upload_bytes`]
    pub async fn upload_from_url(
        &self,
        name: &str,
        source_url: &str,
    ) -> Result<UploadedObject, AppError> {
        let url = url::Url::parse(source_url)
            .map_err(|e| AppError::Fetch(format!("invalid source URL {source_url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Fetch(format!(
                "unsupported source URL scheme: {}",
                url.scheme()
            )));
        }

        let response = self.http_client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("{url} answered {status}")));
        }

        let data = response.bytes().await?;

        tracing::debug!(source = %url, bytes = data.len(), "Fetched remote source");
        self.upload_bytes(name, data.to_vec(), &self.bucket).await
    }

    /// Fetch a whole object
    ///
    /// # Returns
    /// `None` when the object is absent, the store fails, or the call times
    /// out. Failures are logged so the collapsed outcome stays traceable.
    pub async fn get_bytes(&self, name: &str, bucket: Option<&str>) -> Option<Vec<u8>> {
        let bucket = bucket.unwrap_or(&self.bucket);

        match self.timed("get", self.store.get(bucket, name)).await {
            Ok(Some(data)) => {
                BYTES_SERVED.inc_by(data.len() as f64);
                Some(data)
            }
            Ok(None) => {
                tracing::debug!(name = %name, bucket = %bucket, "Object not found");
                None
            }
            Err(error) => {
                tracing::warn!(
                    name = %name,
                    bucket = %bucket,
                    %error,
                    "Object fetch failed; treating as absent"
                );
                None
            }
        }
    }

    /// Remove an object; failures are logged and otherwise ignored
    pub async fn delete_object(&self, name: &str, bucket: &str) {
        if let Err(error) = self.timed("delete", self.store.delete(bucket, name)).await {
            tracing::warn!(name = %name, bucket = %bucket, %error, "Object delete failed");
        }
    }
}

/// Reject names the store or the `/public/:file` route cannot address
fn validate_object_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::InvalidName(format!("{name:?} is not a valid name")));
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(AppError::InvalidName(format!(
            "name exceeds {MAX_NAME_BYTES} bytes"
        )));
    }
    if name.contains('/') || name.chars().any(char::is_control) {
        return Err(AppError::InvalidName(format!(
            "{name:?} contains '/' or control characters"
        )));
    }
    Ok(())
}
