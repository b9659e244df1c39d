use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::backends::{Backend, S3Backend};
use crate::error::{Error, Result};
use crate::path::{self, DIRECTORY_MARKER_SUFFIXES};
use crate::writer::AtomicS3File;
use crate::Config;

/// Filesystem view over an object store.
///
/// One client holds one backend session; share it between targets with an
/// `Arc` rather than creating a client per path.
#[derive(Clone)]
pub struct S3Client {
    backend: Arc<dyn Backend>,
    staging_dir: PathBuf,
}

impl S3Client {
    /// Creates a client on the AWS S3 SDK.
    #[instrument]
    pub async fn new(config: Config) -> Self {
        let backend = S3Backend::new(&config).await;
        let staging_dir = config.staging_dir.unwrap_or_else(std::env::temp_dir);
        Self {
            backend: Arc::new(backend),
            staging_dir,
        }
    }

    /// Creates a client on any backend, staging writes in the process temp
    /// directory.
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            staging_dir: std::env::temp_dir(),
        }
    }

    /// Stages writes in `dir` instead of the process temp directory.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Backend this client talks to.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Directory staging files are created in.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Whether `path` is an object, a marked directory, or a prefix with
    /// objects under it.
    ///
    /// Probes stop at the first hit: bucket root, exact key, directory
    /// markers, then a one-object prefix listing.
    #[instrument(skip(self))]
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let target = path::decompose(path)?;
        self.backend.validate_bucket(&target.bucket).await?;

        if path::is_root(&target.key) {
            debug!("bucket root exists for path {}", path);
            return Ok(true);
        }

        if self
            .backend
            .get_object(&target.bucket, &target.key)
            .await?
            .is_some()
        {
            debug!("file exists for path {}", path);
            return Ok(true);
        }

        for suffix in DIRECTORY_MARKER_SUFFIXES {
            let marker = format!("{}{}", target.key, suffix);
            if self
                .backend
                .get_object(&target.bucket, &marker)
                .await?
                .is_some()
            {
                debug!("directory with suffix {} exists for path {}", suffix, path);
                return Ok(true);
            }
        }

        let prefix = path::strip_leading_slash(&target.key);
        if !self.backend.list(&target.bucket, prefix, 1).await?.is_empty() {
            debug!("directory existence inferred, objects exist under {}", path);
            return Ok(true);
        }

        debug!("path {} does not exist", path);
        Ok(false)
    }

    /// Opens an atomic writer for `path`.
    #[instrument(skip(self))]
    pub async fn open_atomic(&self, path: &str) -> Result<AtomicS3File> {
        let target = path::decompose(path)?;
        AtomicS3File::create(path, target, self.backend.clone(), &self.staging_dir).await
    }

    /// Uploads an existing local file to `dest`, replacing any object there.
    #[instrument(skip(self))]
    pub async fn put(&self, local_path: &Path, dest: &str) -> Result<()> {
        let target = path::decompose(dest)?;
        self.backend
            .put_file(&target.bucket, &target.key, local_path)
            .await
            .map_err(|err| Error::Upload {
                path: dest.to_string(),
                source: err.into(),
            })
    }

    /// Writes `content` to `dest` through an atomic writer.
    #[instrument(skip(self, content))]
    pub async fn put_string(&self, content: &str, dest: &str) -> Result<()> {
        let mut writer = self.open_atomic(dest).await?;
        writer.write_all(content.as_bytes()).await?;
        writer.close().await
    }

    /// Removing objects is not supported.
    pub async fn remove(&self, _path: &str) -> Result<()> {
        Err(Error::NotImplemented("remove"))
    }
}
