#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

//! File-like targets over S3-compatible object storage.
//! Paths use the `s3://bucket/key` form.
//!
//! # Features
//! - Existence checks that understand directories: exact objects,
//!   `_$folder$` and trailing-slash directory markers, and prefixes with
//!   objects under them.
//! - Atomic writes: bytes are staged in a local file and uploaded as one
//!   object on close, so a destination is never seen half written.
//! - Backends behind one trait: AWS S3 SDK, or a local directory for tests.
//! - One shared client per process, passed explicitly to every target.
//!
//! # Usage
//! ```no_run
//! use std::sync::Arc;
//! use object_storage_target::{Config, S3Client, S3Target};
//! use tokio::io::AsyncWriteExt;
//!
//! #[tokio::main]
//! async fn main() -> object_storage_target::Result<()> {
//!     let config = Config {
//!         s3_region: Some("us-east-1".to_string()),
//!         ..Config::default()
//!     };
//!     let fs = Arc::new(S3Client::new(config).await);
//!
//!     let target = S3Target::new("s3://my-bucket/reports/day.csv", fs.clone())?;
//!     if !target.exists().await? {
//!         let mut out = target.open("w").await?;
//!         out.write_all(b"a,b\n1,2\n").await?;
//!         out.close().await?;
//!     }
//!
//!     // Directories are inferred from markers or from objects under a prefix.
//!     assert!(fs.exists("s3://my-bucket/reports").await?);
//!     Ok(())
//! }
//! ```

pub mod backends;
mod error;
mod object_storage;
pub mod path;
mod target;
mod task;
mod writer;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

pub use error::{Error, Result};
pub use object_storage::S3Client;
pub use target::{OpenMode, RandomTempPaths, S3Target, TempPathAllocator};
pub use task::{PathTask, Task};
pub use writer::{AtomicS3File, STAGING_PREFIX};

/// Configuration for the S3 backend and local staging.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Region to use first. When unset the SDK's default provider chain is
    /// consulted, and `us-east-1` is used if that finds nothing.
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible services such as MinIO.
    pub endpoint_url: Option<String>,
    /// Use path-style addressing, required by some S3-compatible services.
    pub force_path_style: bool,
    /// Directory for staging files (defaults to the process temp directory).
    pub staging_dir: Option<PathBuf>,
}

/// What a backend knows about one stored object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object URI as `s3://bucket/key`, key without a leading slash.
    pub key: String,
    /// Body length, when the backend reports it.
    pub size: Option<u64>,
    /// Time of the last put.
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag; absent for the local backend.
    pub etag: Option<String>,
}
