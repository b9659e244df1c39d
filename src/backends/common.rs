//! Backend trait shared by all adapters.

use std::path::Path;

use crate::error::Result;
use crate::ObjectInfo;

#[async_trait::async_trait]
/// Trait for backend-specific operations.
///
/// Keys are passed exactly as decomposed from a storage path and may carry a
/// leading slash; implementations address the object without it.
pub trait Backend: Send + Sync {
    /// Checks that the bucket exists, failing with
    /// [`Error::BucketNotFound`](crate::Error::BucketNotFound) otherwise.
    async fn validate_bucket(&self, bucket: &str) -> Result<()>;

    /// Fetches object metadata, or `None` when no object has this exact key.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>>;

    /// Lists at most `limit` objects whose keys start with `prefix`.
    async fn list(&self, bucket: &str, prefix: &str, limit: usize) -> Result<Vec<ObjectInfo>>;

    /// Uploads a local file as the whole body of the object, replacing any
    /// existing object at that key.
    async fn put_file(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()>;
}

/// Key as addressed inside a bucket.
pub(crate) fn object_name(key: &str) -> &str {
    crate::path::strip_leading_slash(key)
}
