//! 🪣 S3 and everything that speaks its dialect (LocalStack, MinIO, the mock in our tests).
//!
//! Building the store does not touch the network. The first request does.
//! Credentials left unset fall through to the usual AWS environment chain.

use std::sync::Arc;

use anyhow::{Context, Result};
use object_store::{ObjectStore, aws::AmazonS3Builder};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct S3StoreConfig {
    /// 🪣 The bucket. Object paths are keys inside it.
    pub bucket: String,
    /// 🌎 Defaults to "us-east-1", where data goes to retire.
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint URL, e.g. `http://localhost:4566` for LocalStack.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Required for plain `http://` endpoints.
    #[serde(default)]
    pub allow_http: bool,
    /// `bucket.host/key` instead of `host/bucket/key`. Off by default because
    /// the S3 look-alikes mostly want path style.
    #[serde(default)]
    pub virtual_hosted_style: bool,
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

impl S3StoreConfig {
    pub fn describe(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("s3://{} via {}", self.bucket, endpoint),
            None => format!("s3://{} ({})", self.bucket, self.region),
        }
    }
}

pub(super) fn build(config: &S3StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    // -- 🔑 explicit keys win; no keys means the AWS_* environment gets a say
    let base = if config.access_key_id.is_none() && config.secret_access_key.is_none() {
        AmazonS3Builder::from_env()
    } else {
        AmazonS3Builder::new()
    };
    let mut builder = base
        .with_bucket_name(&config.bucket)
        .with_region(&config.region)
        .with_allow_http(config.allow_http)
        .with_virtual_hosted_style_request(config.virtual_hosted_style);

    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
    }
    if let Some(access_key_id) = &config.access_key_id {
        builder = builder.with_access_key_id(access_key_id);
    }
    if let Some(secret_access_key) = &config.secret_access_key {
        builder = builder.with_secret_access_key(secret_access_key);
    }

    let store = builder
        .build()
        .with_context(|| format!("💀 could not build S3 store for {}", config.describe()))?;
    Ok(Arc::new(store))
}
