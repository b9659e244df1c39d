//! File-like handles on object storage paths.

use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;

use crate::error::{Error, Result};
use crate::object_storage::S3Client;
use crate::path;
use crate::writer::AtomicS3File;

/// Mode accepted by [`S3Target::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `"r"`
    Read,
    /// `"w"`
    Write,
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self> {
        match mode {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            other => Err(Error::UnsupportedMode(other.to_string())),
        }
    }
}

/// Source of fresh paths for temporary targets.
pub trait TempPathAllocator: Send + Sync {
    /// Returns a path no other caller has been handed.
    fn allocate(&self) -> String;
}

/// Allocates `<base>/tmp-<nine random digits>`.
#[derive(Debug, Clone)]
pub struct RandomTempPaths {
    base: String,
}

impl RandomTempPaths {
    /// Allocates under `base`, e.g. `s3://bucket/scratch`.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl TempPathAllocator for RandomTempPaths {
    fn allocate(&self) -> String {
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!("{}/tmp-{:09}", self.base.trim_end_matches('/'), n)
    }
}

/// A path in object storage treated as a file.
#[derive(Clone)]
pub struct S3Target {
    path: String,
    format: Option<String>,
    is_tmp: bool,
    fs: Arc<S3Client>,
}

impl S3Target {
    /// Binds `path` to `fs`.
    ///
    /// Fails with [`Error::MalformedPath`] if the path does not parse or its
    /// path component contains a colon.
    pub fn new(path: impl Into<String>, fs: Arc<S3Client>) -> Result<Self> {
        let path = path.into();
        let parsed = path::decompose(&path)?;
        if parsed.key.contains(':') {
            return Err(Error::malformed(&path, "colon is not allowed in the path"));
        }
        Ok(Self {
            path,
            format: None,
            is_tmp: false,
            fs,
        })
    }

    /// Target at a freshly allocated temporary path.
    pub fn temporary(fs: Arc<S3Client>, allocator: &dyn TempPathAllocator) -> Result<Self> {
        let mut target = Self::new(allocator.allocate(), fs)?;
        target.is_tmp = true;
        Ok(target)
    }

    /// Attaches a format hint for consumers of this target.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Path this target points at.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Format hint, if any.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Whether the path was allocated as a temporary one.
    pub fn is_tmp(&self) -> bool {
        self.is_tmp
    }

    /// Client backing this target.
    pub fn fs(&self) -> &Arc<S3Client> {
        &self.fs
    }

    /// See [`S3Client::exists`].
    pub async fn exists(&self) -> Result<bool> {
        self.fs.exists(&self.path).await
    }

    /// Opens the target. Only `"w"` is supported; `"r"` reports
    /// [`Error::NotImplemented`] and anything else [`Error::UnsupportedMode`].
    pub async fn open(&self, mode: &str) -> Result<AtomicS3File> {
        match mode.parse::<OpenMode>()? {
            OpenMode::Write => self.fs.open_atomic(&self.path).await,
            OpenMode::Read => Err(Error::NotImplemented("read")),
        }
    }

    /// Removing targets is not supported.
    pub async fn remove(&self) -> Result<()> {
        self.fs.remove(&self.path).await
    }
}

impl std::fmt::Debug for S3Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Target")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("is_tmp", &self.is_tmp)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::LocalBackend;

    fn client() -> Arc<S3Client> {
        Arc::new(S3Client::with_backend(Arc::new(LocalBackend::new(
            "/nonexistent-store",
        ))))
    }

    #[test]
    fn test_open_mode_parse() {
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("w".parse::<OpenMode>().unwrap(), OpenMode::Write);
        assert!(matches!(
            "rw".parse::<OpenMode>(),
            Err(Error::UnsupportedMode(m)) if m == "rw"
        ));
    }

    #[test]
    fn test_colon_rejected() {
        let err = S3Target::new("s3://bucket/a:b", client()).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
        assert!(S3Target::new("s3://bucket/a/b", client()).is_ok());
    }

    #[test]
    fn test_random_temp_paths() {
        let alloc = RandomTempPaths::new("s3://bucket/scratch/");
        let path = alloc.allocate();
        let suffix = path.strip_prefix("s3://bucket/scratch/tmp-").unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));

        let target = S3Target::temporary(client(), &alloc).unwrap();
        assert!(target.is_tmp());
        assert!(target.path().starts_with("s3://bucket/scratch/tmp-"));
    }

    #[test]
    fn test_format_hint() {
        let target = S3Target::new("s3://bucket/a.gz", client())
            .unwrap()
            .with_format("gzip");
        assert_eq!(target.format(), Some("gzip"));
        assert!(!target.is_tmp());
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let target = S3Target::new("s3://bucket/a", client()).unwrap();
        assert!(matches!(
            target.open("x").await,
            Err(Error::UnsupportedMode(m)) if m == "x"
        ));
        assert!(matches!(
            target.open("r").await,
            Err(Error::NotImplemented("read"))
        ));
        assert!(matches!(
            target.remove().await,
            Err(Error::NotImplemented("remove"))
        ));
    }
}
