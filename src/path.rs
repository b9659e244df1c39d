//! Mapping between storage paths (`s3://bucket/key`) and object keys.

use crate::error::{Error, Result};
use url::Url;

/// Suffixes that mark a logical directory when appended to a key.
///
/// Both conventions are in use by different S3 tools, so either suffices.
pub const DIRECTORY_MARKER_SUFFIXES: [&str; 2] = ["_$folder$", "/"];

/// A path decomposed into its bucket and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    /// Bucket name, taken from the URI host.
    pub bucket: String,
    /// Key within the bucket, including any leading slash.
    pub key: String,
}

/// Splits a storage path into `(bucket, key)`.
///
/// The host is the bucket and the remaining path, leading slash included,
/// is the key, taken verbatim: no dot-segment removal and no percent
/// decoding. Query and fragment are ignored. Bucket names are not
/// validated here beyond being non-empty.
pub fn decompose(path: &str) -> Result<ObjectKey> {
    let url = Url::parse(path).map_err(|e| Error::malformed(path, e.to_string()))?;
    let bucket = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| Error::malformed(path, "missing bucket"))?;

    // `Url::path` normalizes `.`/`..` segments, so slice the raw input.
    let (_, rest) = path
        .split_once("://")
        .ok_or_else(|| Error::malformed(path, "missing bucket"))?;
    let rest = &rest[..rest.find(|c: char| c == '?' || c == '#').unwrap_or(rest.len())];
    let key = rest.find('/').map_or("", |start| &rest[start..]);

    Ok(ObjectKey {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

/// Removes exactly one leading `/`, if present.
pub fn strip_leading_slash(key: &str) -> &str {
    key.strip_prefix('/').unwrap_or(key)
}

/// True when the key addresses the bucket root.
pub fn is_root(key: &str) -> bool {
    key.is_empty() || key == "/"
}
