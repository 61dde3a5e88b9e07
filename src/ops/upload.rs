//! Package archiving and upload to the artifact store.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use url::Url;

use crate::builder::executor::BuiltPackage;
use crate::core::errors::PublishError;
use crate::core::publish::PublishTarget;
use crate::core::recipe::{PackageIdentity, PackageRecipe};
use crate::util::fs::list_files;
use crate::util::hash::sha256_bytes;

/// Record of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub reference: String,
    pub identity: PackageIdentity,
    pub url: String,
    /// SHA256 of the uploaded archive
    pub sha256: String,
}

/// Sends a built package to a publish target.
pub trait Uploader {
    fn upload(
        &mut self,
        recipe: &PackageRecipe,
        package: &BuiltPackage,
        target: &PublishTarget,
    ) -> Result<UploadReceipt, PublishError>;
}

/// Where a package archive is uploaded:
/// `<endpoint>/<name>/<version>/<user>/<channel>/<identity>.tgz`.
pub fn upload_url(
    recipe: &PackageRecipe,
    identity: &PackageIdentity,
    target: &PublishTarget,
) -> Result<Url, PublishError> {
    let version = recipe
        .version()
        .ok_or_else(|| PublishError::UnknownVersion {
            package: recipe.name().to_string(),
        })?;

    let raw = format!(
        "{}/{}/{}/{}/{}/{}.tgz",
        target.endpoint.trim_end_matches('/'),
        recipe.name(),
        version,
        target.username,
        target.channel,
        identity
    );
    Url::parse(&raw).map_err(|source| PublishError::InvalidUrl { url: raw, source })
}

/// Archive a package directory as a gzipped tarball.
///
/// Entries are sorted and carry no timestamps or ownership, so the same
/// directory always yields the same bytes.
pub fn archive_package(root: &Path) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(encoder);

    for relative in list_files(root)? {
        let path = root.join(&relative);
        let file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        let len = file.metadata()?.len();

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(len);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);

        let name = relative.to_string_lossy().replace('\\', "/");
        tar.append_data(&mut header, &name, file)
            .with_context(|| format!("failed to archive {}", path.display()))?;
    }

    let encoder = tar.into_inner().context("failed to finish tar archive")?;
    encoder.finish().context("failed to finish gzip stream")
}

/// Uploads over HTTP with basic authentication.
pub struct HttpUploader {
    client: Client,
}

impl HttpUploader {
    pub fn new() -> Self {
        HttpUploader {
            client: Client::new(),
        }
    }
}

impl Default for HttpUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl Uploader for HttpUploader {
    fn upload(
        &mut self,
        recipe: &PackageRecipe,
        package: &BuiltPackage,
        target: &PublishTarget,
    ) -> Result<UploadReceipt, PublishError> {
        let url = upload_url(recipe, &package.identity, target)?;
        let credentials = target.credentials.resolve()?;
        let body = archive_package(&package.layout.root).map_err(PublishError::Archive)?;
        let reference = target.reference(recipe.name(), recipe.display_version());
        let sha256 = sha256_bytes(&body);

        tracing::info!("Uploading {} to {} ({} bytes)", reference, target.remote, body.len());

        let response = self
            .client
            .put(url.clone())
            .basic_auth(&credentials.login, Some(&credentials.password))
            .header(CONTENT_TYPE, "application/gzip")
            .header("X-Checksum-Sha256", &sha256)
            .body(body)
            .send()
            .map_err(|source| PublishError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(UploadReceipt {
            reference,
            identity: package.identity.clone(),
            url: url.to_string(),
            sha256,
        })
    }
}
