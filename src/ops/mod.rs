//! High-level operations.
//!
//! This module contains the implementation of tsl-release commands.

pub mod release;
pub mod upload;

pub use release::{plan_matrix, release, run_matrix, MatrixOptions, ReleaseOptions, RunReport};
pub use upload::{archive_package, HttpUploader, UploadReceipt, Uploader};
