//! Atomic writes: bytes are staged in a private local file and uploaded as a
//! single object only when the writer is closed.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};

use crate::backends::Backend;
use crate::error::{Error, Result};
use crate::path::ObjectKey;

/// File name prefix of staging files.
pub const STAGING_PREFIX: &str = "object-storage-target-";

const MAX_NAME_ATTEMPTS: usize = 8;

/// Local staging file, removed when dropped.
#[derive(Debug)]
struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    async fn create(dir: &Path) -> Result<(Self, File)> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(format!("{}{}", STAGING_PREFIX, rand::random::<u64>()));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((Self { path }, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free staging file name in {}", dir.display()),
        )
        .into())
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(staging = %self.path.display(), error = %err, "failed to remove staging file");
            }
        }
    }
}

/// Write handle whose content becomes visible at its destination only after
/// a successful [`close`](AtomicS3File::close).
///
/// Dropping the handle without closing it uploads nothing; the staging file
/// is removed either way.
pub struct AtomicS3File {
    file: BufWriter<File>,
    staging: StagingFile,
    path: String,
    target: ObjectKey,
    backend: Arc<dyn Backend>,
    closed: bool,
}

impl AtomicS3File {
    pub(crate) async fn create(
        path: &str,
        target: ObjectKey,
        backend: Arc<dyn Backend>,
        staging_dir: &Path,
    ) -> Result<Self> {
        let (staging, file) = StagingFile::create(staging_dir).await?;
        debug!(path, staging = %staging.path.display(), "opened staging file");
        Ok(Self {
            file: BufWriter::new(file),
            staging,
            path: path.to_string(),
            target,
            backend,
            closed: false,
        })
    }

    /// Destination path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Local file the writes are staged in.
    pub fn staging_path(&self) -> &Path {
        &self.staging.path
    }

    /// Flushes the staging file and uploads it as the destination object.
    ///
    /// The staging file is removed whether or not the upload succeeds. On
    /// failure the destination is left as it was.
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        self.file.shutdown().await?;
        self.backend
            .put_file(&self.target.bucket, &self.target.key, &self.staging.path)
            .await
            .map_err(|err| Error::Upload {
                path: self.path.clone(),
                source: err.into(),
            })?;
        debug!("committed");
        Ok(())
    }
}

impl Drop for AtomicS3File {
    fn drop(&mut self) {
        if !self.closed {
            warn!(path = %self.path, "writer dropped without close, discarding staged data");
        }
    }
}

impl AsyncWrite for AtomicS3File {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.file).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_shutdown(cx)
    }
}
