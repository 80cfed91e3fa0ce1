//! S3-compatible object store
//!
//! Talks to any endpoint speaking the S3 API with static credentials.

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};

use super::{ObjectStore, build_s3_http_client};
use crate::config::StorageConfig;
use crate::error::AppError;

const DEFAULT_REGION: &str = "us-east-1";

/// Object store backed by an S3-compatible service
pub struct S3ObjectStore {
    client: S3Client,
    region: String,
}

impl S3ObjectStore {
    /// Create new S3 client
    ///
    /// No request is sent here; connectivity problems surface on the
    /// first store call.
    pub fn new(config: &StorageConfig) -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "bucketgate-static",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style)
            .http_client(build_s3_http_client())
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            region: config.region.clone(),
        }
    }
}

/// True when the store answered a failed call with HTTP 404
fn is_not_found<E>(err: &SdkError<E>) -> bool {
    err.raw_response()
        .is_some_and(|response| response.status().as_u16() == 404)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(bucket)
            .key(name)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!("S3 upload failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, AppError> {
        use aws_sdk_s3::operation::get_object::GetObjectError;

        let output = match self.client.get_object().bucket(bucket).key(name).send().await {
            Ok(output) => output,
            Err(err) => {
                if matches!(err.as_service_error(), Some(GetObjectError::NoSuchKey(_)))
                    || is_not_found(&err)
                {
                    return Ok(None);
                }
                return Err(AppError::Storage(format!(
                    "S3 get failed: {}",
                    DisplayErrorContext(&err)
                )));
            }
        };

        // Drain the body stream; `collect` resolves only at end of stream.
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("S3 body read failed: {}", e)))?;

        Ok(Some(data.into_bytes().to_vec()))
    }

    async fn delete(&self, bucket: &str, name: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!("S3 delete failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), AppError> {
        use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                tracing::info!(bucket = %bucket, "Bucket exists");
                return Ok(());
            }
            Err(err) if is_not_found(&err) => {}
            Err(err) => {
                return Err(AppError::Storage(format!(
                    "S3 bucket check failed: {}",
                    DisplayErrorContext(&err)
                )));
            }
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(|e| {
            AppError::Storage(format!("S3 bucket creation failed: {}", DisplayErrorContext(&e)))
        })?;

        tracing::info!(bucket = %bucket, region = %self.region, "Bucket created");
        Ok(())
    }
}
