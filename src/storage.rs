use std::path::PathBuf;

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use crate::config::{S3Config, StorageConfig};

/// Blob store for resumes, profile photos and company logos.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Stores `body` under `key` and returns the public URL to record.
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3Storage {
    pub async fn new(cfg: &S3Config) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        let public_base = cfg.public_url.clone().unwrap_or_else(|| {
            format!("{}/{}", cfg.endpoint.trim_end_matches('/'), cfg.bucket)
        });

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

/// Fallback used when no bucket is configured; files are served back
/// under `/uploads`.
#[derive(Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, server_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base: format!("{}/uploads", server_url.trim_end_matches('/')),
        }
    }

    fn object_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            !key.split('/').any(|seg| seg == ".." || seg.is_empty()),
            "invalid object key {key}"
        );
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageClient for LocalDiskStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        let path = self.object_path(key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create upload dir {}", dir.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        debug!(key, bytes = body.len(), "stored upload on local disk");
        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove upload {}", path.display())),
        }
    }
}

/// Picks S3 when configured, local disk otherwise.
pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<std::sync::Arc<dyn StorageClient>> {
    match &cfg.s3 {
        Some(s3) => {
            info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "using s3 object storage");
            Ok(std::sync::Arc::new(S3Storage::new(s3).await?))
        }
        None => {
            info!(dir = %cfg.uploads_dir, "object storage not configured; using local disk");
            Ok(std::sync::Arc::new(LocalDiskStorage::new(
                &cfg.uploads_dir,
                &cfg.server_url,
            )))
        }
    }
}
