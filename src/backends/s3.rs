//! AWS S3 SDK backend.

use std::path::Path;

use anyhow::Context;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::{ByteStream, DateTime as S3DateTime};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::backends::common::{object_name, Backend};
use crate::error::{Error, Result};
use crate::{Config, ObjectInfo};

/// Backend on the AWS S3 SDK. Works with any S3-compatible endpoint.
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    /// Builds a client from `config`, falling back to the SDK's default
    /// region and credential providers.
    pub async fn new(config: &Config) -> Self {
        let region_provider =
            RegionProviderChain::first_try(config.s3_region.clone().map(Region::new))
                .or_default_provider()
                .or_else(Region::new("us-east-1"));
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();
        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Wraps an already configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_chrono(dt: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait::async_trait]
impl Backend for S3Backend {
    async fn validate_bucket(&self, bucket: &str) -> Result<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {
                Err(Error::BucketNotFound(bucket.to_string()))
            }
            Err(err) => Err(Error::unavailable(err)),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>> {
        let name = object_name(key);
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
        {
            Ok(head) => Ok(Some(ObjectInfo {
                key: format!("s3://{}/{}", bucket, name),
                size: head.content_length().map(|s| s as u64),
                last_modified: head.last_modified().and_then(to_chrono),
                etag: head.e_tag().map(str::to_string),
            })),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(None),
            Err(err) => Err(Error::unavailable(err)),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str, limit: usize) -> Result<Vec<ObjectInfo>> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(i32::try_from(limit).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(Error::unavailable)?;
        let mut objects = Vec::new();
        for obj in resp.contents().iter().take(limit) {
            let key = obj
                .key()
                .context("Missing S3 object key")
                .map_err(Error::BackendUnavailable)?;
            objects.push(ObjectInfo {
                key: format!("s3://{}/{}", bucket, key),
                size: obj.size().map(|s| s as u64),
                last_modified: obj.last_modified().and_then(to_chrono),
                etag: obj.e_tag().map(str::to_string),
            });
        }
        Ok(objects)
    }

    async fn put_file(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(Error::unavailable)?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(object_name(key))
            .body(body)
            .send()
            .await
            .map_err(Error::unavailable)?;
        debug!(bucket, key, "put object");
        Ok(())
    }
}
