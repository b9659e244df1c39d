use thiserror::Error;

/// Errors raised by targets, writers and backends.
#[derive(Debug, Error)]
pub enum Error {
    /// The path is not a parseable URI or uses a reserved character.
    #[error("malformed path '{path}': {reason}")]
    MalformedPath {
        /// Offending path.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The bucket named by a path does not exist.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// A round-trip to the backend failed at the transport or service level.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] anyhow::Error),

    /// `open` was called with a mode other than read or write.
    #[error("unsupported open mode '{0}'")]
    UnsupportedMode(String),

    /// Committing a staged write to the backend failed.
    #[error("upload to {path} failed")]
    Upload {
        /// Destination path of the failed commit.
        path: String,
        /// Underlying backend failure.
        #[source]
        source: anyhow::Error,
    },

    /// The capability is declared but intentionally not built.
    #[error("{0} is not implemented for object storage targets")]
    NotImplemented(&'static str),

    /// Local staging I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(err: impl Into<anyhow::Error>) -> Self {
        Self::BackendUnavailable(err.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
