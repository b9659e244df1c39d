//! Object storage backends behind a common trait.

pub mod common;
pub mod local;
pub mod s3;

pub use common::Backend;
pub use local::LocalBackend;
pub use s3::S3Backend;
