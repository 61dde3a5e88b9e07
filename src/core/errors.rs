//! Error types for packaging, building and publishing.
//!
//! Version resolution has no error type: an unresolved version is `None`.

use std::path::PathBuf;

use thiserror::Error;

/// Error while staging a package directory.
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("no headers found under `{}` after the install step", dir.display())]
    HeadersNotFound { dir: PathBuf },

    #[error("install step for `{package}` failed")]
    Install {
        package: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Staging(#[from] anyhow::Error),
}

/// Error while building one matrix configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("packaging failed for {configuration}")]
    Packaging {
        configuration: String,
        #[source]
        source: PackagingError,
    },

    #[error("test package failed for {configuration}")]
    TestPackage {
        configuration: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Error while uploading a package.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("cannot publish `{package}` without a resolved version")]
    UnknownVersion { package: String },

    #[error("credential variable `{var}` is not set")]
    MissingCredentials { var: String },

    #[error("invalid upload url `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upload to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upload to {url} was rejected: HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("failed to archive package")]
    Archive(#[source] anyhow::Error),
}
