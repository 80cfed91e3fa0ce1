//! BucketGate - a small HTTP gateway in front of an S3-compatible object store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /public, /trans file serving                             │
//! │  - /upload form and /validate password check                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Service Layer / Retry Limiter                   │
//! │  - Object gateway (upload, fetch, delete, public URLs)      │
//! │  - Per-client password attempt accounting                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Storage Layer                            │
//! │  - S3-compatible buckets (aws-sdk-s3)                       │
//! │  - In-memory store                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Object store adapter
//! - `auth`: Upload password retry limiter
//! - `storage`: Object store backends
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Object store adapter
    pub gateway: Arc<service::ObjectGateway>,

    /// Upload password retry limiter
    pub limiter: Arc<auth::RetryLimiter>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Build the configured object store backend
    /// 2. Ensure the destination bucket exists
    /// 3. Build the gateway and retry limiter
    ///
    /// # Errors
    /// Returns error if the bucket cannot be checked or created
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let store: Arc<dyn storage::ObjectStore> = match config.storage.backend {
            config::StorageBackend::S3 => {
                tracing::info!(
                    endpoint = %config.storage.endpoint_url(),
                    region = %config.storage.region,
                    "Connecting to S3-compatible store"
                );
                Arc::new(storage::S3ObjectStore::new(&config.storage))
            }
            config::StorageBackend::Memory => Arc::new(storage::MemoryObjectStore::new()),
        };

        store.ensure_bucket(&config.storage.bucket).await?;
        tracing::info!(bucket = %config.storage.bucket, "Object store ready");

        Self::with_store(config, store)
    }

    /// Initialize application state around an existing store
    ///
    /// Does not touch the store; used by tests and embedders.
    pub fn with_store(
        config: config::AppConfig,
        store: Arc<dyn storage::ObjectStore>,
    ) -> Result<Self, error::AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("BucketGate/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.storage.timeout_seconds))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let gateway = service::ObjectGateway::new(store, &config, http_client);
        let limiter = auth::RetryLimiter::new(
            config.limiter.max_attempts,
            config.limiter.max_tracked_clients,
        );

        Ok(Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            limiter: Arc::new(limiter),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::files_router())
        .merge(api::upload_router(state.config.upload.max_bytes))
        .layer(middleware::from_fn(api::metrics::track_http_metrics))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::with_store(
            config::tests::valid_config(),
            Arc::new(storage::MemoryObjectStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn requests_without_connect_info_share_unknown_client() {
        let state = test_state();
        let app = build_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/validate/wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.limiter.remaining(api::UNKNOWN_CLIENT).await, 4);
    }

    #[tokio::test]
    async fn public_file_with_empty_store_is_bad_request() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/public/missing.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
