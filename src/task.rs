//! Minimal task contract for schedulers that use target existence as the
//! completion signal.

use std::sync::Arc;

use crate::error::Result;
use crate::object_storage::S3Client;
use crate::target::S3Target;

/// A unit of work whose completion is the existence of its output.
#[async_trait::async_trait]
pub trait Task: Send + Sync {
    /// Target this task produces.
    fn output(&self) -> S3Target;

    /// Whether the output already exists.
    async fn complete(&self) -> Result<bool> {
        self.output().exists().await
    }
}

/// External precondition: a path that something else must have produced.
///
/// Does no work itself.
#[derive(Debug, Clone)]
pub struct PathTask {
    target: S3Target,
}

impl PathTask {
    /// Declares `path` as required. Fails if the path is malformed.
    pub fn new(path: impl Into<String>, fs: Arc<S3Client>) -> Result<Self> {
        Ok(Self {
            target: S3Target::new(path, fs)?,
        })
    }

    /// Required path.
    pub fn path(&self) -> &str {
        self.target.path()
    }
}

#[async_trait::async_trait]
impl Task for PathTask {
    fn output(&self) -> S3Target {
        self.target.clone()
    }
}
