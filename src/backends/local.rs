//! Local-directory emulation of an object store.

use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::Context;
use chrono::DateTime;
use walkdir::WalkDir;

use crate::backends::common::{object_name, Backend};
use crate::error::{Error, Result};
use crate::ObjectInfo;

const STAGING_DIR: &str = ".staging";

/// Object store emulated on a local directory.
///
/// Every bucket is a directory under `root` and every object a flat file in
/// it, named by the percent-encoded key, so keys containing `/` (including
/// trailing-slash directory markers) stay distinct objects as they are in S3.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Serves buckets found under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates an empty bucket if it does not exist yet.
    pub async fn create_bucket(&self, bucket: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.bucket_dir(bucket)).await?;
        Ok(())
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let encoded = urlencoding::encode(object_name(key));
        // A leading dot would let "." and ".." escape the bucket directory.
        let file_name = match encoded.strip_prefix('.') {
            Some(rest) => format!("%2E{}", rest),
            None => encoded.into_owned(),
        };
        self.bucket_dir(bucket).join(file_name)
    }
}

fn object_info(bucket: &str, name: &str, meta: &Metadata) -> ObjectInfo {
    let last_modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| DateTime::from_timestamp(d.as_secs() as i64, d.subsec_nanos()).unwrap_or_default());
    ObjectInfo {
        key: format!("s3://{}/{}", bucket, name),
        size: Some(meta.len()),
        last_modified,
        etag: None,
    }
}

#[async_trait::async_trait]
impl Backend for LocalBackend {
    async fn validate_bucket(&self, bucket: &str) -> Result<()> {
        match tokio::fs::metadata(self.bucket_dir(bucket)).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::BucketNotFound(bucket.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(Error::BucketNotFound(bucket.to_string()))
            }
            Err(err) => Err(Error::unavailable(err)),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>> {
        match tokio::fs::metadata(self.object_path(bucket, key)).await {
            Ok(meta) if meta.is_file() => Ok(Some(object_info(bucket, object_name(key), &meta))),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::unavailable(err)),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str, limit: usize) -> Result<Vec<ObjectInfo>> {
        let dir = self.bucket_dir(bucket);
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<ObjectInfo>> {
            let mut objs = vec![];
            for entry in WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .follow_links(false)
            {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let encoded = entry
                    .file_name()
                    .to_str()
                    .context("Invalid object file name")?;
                let name = urlencoding::decode(encoded)?.into_owned();
                if name.starts_with(&prefix) {
                    let meta = entry.metadata()?;
                    objs.push(object_info(&bucket, &name, &meta));
                }
            }
            objs.sort_by(|a, b| a.key.cmp(&b.key));
            objs.truncate(limit);
            Ok(objs)
        })
        .await
        .map_err(Error::unavailable)?
        .map_err(Error::BackendUnavailable)
    }

    async fn put_file(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        self.validate_bucket(bucket).await?;
        let staging = self.root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(Error::unavailable)?;
        let tmp = staging.join(format!("{}-{}", std::process::id(), rand::random::<u64>()));
        if let Err(err) = tokio::fs::copy(local_path, &tmp).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::unavailable(err));
        }
        // Rename within one filesystem, so readers never see a partial object.
        if let Err(err) = tokio::fs::rename(&tmp, self.object_path(bucket, key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::unavailable(err));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_object_path_stays_inside_bucket() {
        let backend = LocalBackend::new("/srv/store");
        assert_eq!(
            backend.object_path("b", "/data/x.txt"),
            PathBuf::from("/srv/store/b/data%2Fx.txt")
        );
        assert_eq!(backend.object_path("b", ".."), PathBuf::from("/srv/store/b/%2E."));
        assert_eq!(backend.object_path("b", "dir/"), PathBuf::from("/srv/store/b/dir%2F"));
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path());
        let err = backend.validate_bucket("nope").await.unwrap_err();
        assert!(matches!(err, Error::BucketNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_list_surfaces_walk_errors() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path());
        let err = backend.list("nope", "", 1).await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_put_then_list_with_prefix() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path().join("store"));
        backend.create_bucket("b").await.unwrap();

        let local = dir.path().join("body");
        std::fs::write(&local, b"hello").unwrap();
        for key in ["a/2", "a/1", "b/1", "a/"] {
            backend.put_file("b", key, &local).await.unwrap();
        }

        let listed = backend.list("b", "a/", 10).await.unwrap();
        let keys: Vec<_> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["s3://b/a/", "s3://b/a/1", "s3://b/a/2"]);

        let limited = backend.list("b", "a", 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        let info = backend.get_object("b", "/a/1").await.unwrap().unwrap();
        assert_eq!(info.size, Some(5));
        assert!(backend.get_object("b", "a").await.unwrap().is_none());
    }
}
