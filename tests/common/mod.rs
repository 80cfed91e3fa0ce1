//! Common test utilities for E2E tests

use std::net::SocketAddr;
use std::sync::Arc;

use bucketgate::storage::{MemoryObjectStore, ObjectStore};
use bucketgate::{AppState, config};
use tokio::net::TcpListener;

pub const UPLOAD_PASSWORD: &str = "pass2";
pub const DOMAIN: &str = "files.test.example.com";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub store: Arc<MemoryObjectStore>,
    pub client: reqwest::Client,
}

/// Configuration used by every test server
pub fn test_config() -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: DOMAIN.to_string(),
            protocol: "https".to_string(),
            trust_forwarded_for: false,
        },
        storage: config::StorageConfig {
            backend: config::StorageBackend::Memory,
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            region: "us-east-1".to_string(),
            bucket: "public".to_string(),
            use_ssl: true,
            force_path_style: true,
            timeout_seconds: 5,
        },
        upload: config::UploadConfig {
            password: UPLOAD_PASSWORD.to_string(),
            max_bytes: 1024 * 1024,
        },
        limiter: config::LimiterConfig {
            max_attempts: 5,
            max_tracked_clients: 100,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test server with a customized configuration
    pub async fn with_config(config: config::AppConfig) -> Self {
        let store = Arc::new(MemoryObjectStore::new());
        let state = AppState::with_store(config, store.clone() as Arc<dyn ObjectStore>).unwrap();

        // Redirects are asserted on, not followed
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = bucketgate::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            addr: addr_str,
            state,
            store,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Put an object directly into the backing store
    pub async fn seed(&self, bucket: &str, name: &str, data: &[u8]) {
        self.store
            .put(bucket, name, data.to_vec(), "application/octet-stream")
            .await
            .unwrap();
    }

    /// Submit the upload form
    pub async fn post_upload(
        &self,
        pass: Option<&str>,
        file: Option<(&str, Vec<u8>)>,
    ) -> reqwest::Response {
        let mut form = reqwest::multipart::Form::new();
        if let Some(pass) = pass {
            form = form.text("pass", pass.to_string());
        }
        if let Some((name, data)) = file {
            form = form.part(
                "file",
                reqwest::multipart::Part::bytes(data).file_name(name.to_string()),
            );
        }

        self.client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    /// Query the password endpoint, returning the body
    pub async fn validate(&self, pass: &str) -> String {
        let response = self
            .client
            .get(self.url(&format!("/validate/{pass}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.text().await.unwrap()
    }
}
