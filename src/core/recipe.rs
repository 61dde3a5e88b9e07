//! Package recipe: identity of the package and how it is staged.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Serialize;

use crate::builder::cmake;
use crate::core::configuration::BuildConfiguration;
use crate::core::errors::PackagingError;
use crate::core::version::{display_version, resolve_version};
use crate::util::config::{InstallStrategy, PackageConfig};
use crate::util::fs::{
    copy_file, ensure_dir, find_file_ignore_case, glob_files, list_files, relative_path,
    remove_dir_all_if_exists,
};
use crate::util::hash::Fingerprint;

/// File extensions counted as headers when validating a staged package.
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "ipp", "tpp", "inl"];

/// Directories under the source root that only ever hold build output.
const BUILD_DIRS: &[&str] = &["target", "build"];

/// Deduplication key of a built package in the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PackageIdentity(String);

impl PackageIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What `package()` put into the output directory.
#[derive(Debug, Clone)]
pub struct PackageLayout {
    pub root: PathBuf,
    /// Bundled license, relative to `root`
    pub license: Option<PathBuf>,
    /// Installed headers, relative to `root`
    pub headers: Vec<PathBuf>,
}

/// The package recipe. Built once per process; the version is resolved
/// while loading and cannot change afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PackageRecipe {
    name: String,
    url: String,
    version: Option<String>,
    license: String,
    description: String,
    exports_sources: Vec<String>,
    exports: Vec<String>,
    header_only: bool,
    #[serde(skip)]
    install: InstallStrategy,
    #[serde(skip)]
    headers: Vec<String>,
    #[serde(skip)]
    metadata: PathBuf,
    #[serde(skip)]
    source_dir: PathBuf,
}

impl PackageRecipe {
    /// Build the recipe for the library at `source_dir`, reading the version
    /// from the configured metadata file.
    pub fn load(source_dir: &Path, config: &PackageConfig) -> Self {
        let metadata = source_dir.join(&config.metadata);
        let version = resolve_version(&metadata, Some(&config.name));
        Self::with_version(source_dir, config, version)
    }

    /// Build the recipe with an already known version.
    pub fn with_version(source_dir: &Path, config: &PackageConfig, version: Option<String>) -> Self {
        PackageRecipe {
            name: config.name.clone(),
            url: config.url.clone(),
            version,
            license: config.license.clone(),
            description: config.description.clone(),
            exports_sources: config.exports_sources.clone(),
            exports: config.exports.clone(),
            header_only: config.header_only,
            install: config.install,
            headers: config.headers.clone(),
            metadata: config.metadata.clone(),
            source_dir: source_dir.to_path_buf(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The version, or `unknown`.
    pub fn display_version(&self) -> &str {
        display_version(self.version())
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn exports_sources(&self) -> &[String] {
        &self.exports_sources
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// A configuration-invariant recipe produces the same package for every
    /// build configuration, so one representative build is enough.
    pub fn is_configuration_invariant(&self) -> bool {
        self.header_only
    }

    /// Source files shipped with the recipe, relative to the source root.
    pub fn exported_sources(&self) -> anyhow::Result<Vec<PathBuf>> {
        let files = glob_files(&self.source_dir, &self.exports_sources)?;
        Ok(files
            .iter()
            .map(|f| relative_path(&self.source_dir, f))
            .collect())
    }

    /// Identity of the package built for `config`.
    ///
    /// Header-only recipes ignore the configuration entirely.
    pub fn compute_identity(&self, config: &BuildConfiguration) -> PackageIdentity {
        let mut fp = Fingerprint::new();
        fp.field("name", &self.name)
            .field_opt("version", self.version());

        if self.header_only {
            fp.field("payload", "header-only");
        } else {
            fp.field("compiler", &config.compiler)
                .field_opt("compiler.version", config.compiler_version.as_deref())
                .field("arch", &config.arch)
                .field("build_type", &config.build_type)
                .field_opt("compiler.libcxx", config.libcxx.as_deref());
        }

        PackageIdentity(fp.finish())
    }

    /// Stage the package into `output_dir`.
    ///
    /// The directory is recreated, so staging twice yields the same tree.
    pub fn package(&self, output_dir: &Path) -> Result<PackageLayout, PackagingError> {
        self.check_output_dir(output_dir)?;

        remove_dir_all_if_exists(output_dir)?;
        ensure_dir(output_dir)?;

        let license = self.copy_license(output_dir)?;
        self.install(output_dir)?;

        let include_dir = output_dir.join("include");
        let headers: Vec<PathBuf> = if include_dir.is_dir() {
            list_files(&include_dir)?
                .into_iter()
                .filter(|p| is_header(p))
                .map(|p| Path::new("include").join(p))
                .collect()
        } else {
            Vec::new()
        };

        if headers.is_empty() {
            return Err(PackagingError::HeadersNotFound { dir: include_dir });
        }

        tracing::info!(
            "Packaged {} v{} ({} headers) into {}",
            self.name,
            self.display_version(),
            headers.len(),
            output_dir.display()
        );

        Ok(PackageLayout {
            root: output_dir.to_path_buf(),
            license,
            headers,
        })
    }

    /// Refuse an existing output directory whose removal would destroy
    /// library sources: the source root itself or any directory holding
    /// header, exported or metadata files. Build directories are always fine.
    fn check_output_dir(&self, output_dir: &Path) -> Result<(), PackagingError> {
        if !output_dir.exists() {
            return Ok(());
        }
        let output = output_dir
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", output_dir.display()))?;
        let sources = self
            .source_dir
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", self.source_dir.display()))?;

        if sources.starts_with(&output) {
            return Err(anyhow!(
                "refusing to stage into {}: it contains the library sources",
                output_dir.display()
            )
            .into());
        }

        let Ok(relative) = output.strip_prefix(&sources) else {
            return Ok(());
        };
        let in_build_dir = relative
            .components()
            .next()
            .is_some_and(|c| BUILD_DIRS.iter().any(|d| c.as_os_str() == *d));
        if in_build_dir {
            return Ok(());
        }

        let patterns: Vec<String> = self
            .headers
            .iter()
            .chain(&self.exports_sources)
            .cloned()
            .collect();
        let mut protected = glob_files(&sources, &patterns)?;
        let metadata = sources.join(&self.metadata);
        if metadata.is_file() {
            protected.push(metadata);
        }

        if let Some(file) = protected.iter().find(|f| f.starts_with(&output)) {
            return Err(anyhow!(
                "refusing to stage into {}: it holds library source {}",
                output_dir.display(),
                relative_path(&sources, file).display()
            )
            .into());
        }
        Ok(())
    }

    /// Copy the first license file found into `licenses/`.
    fn copy_license(&self, output_dir: &Path) -> Result<Option<PathBuf>, PackagingError> {
        let ignored: Vec<PathBuf> = std::iter::once(".git")
            .chain(BUILD_DIRS.iter().copied())
            .map(|d| self.source_dir.join(d))
            .collect();
        let mut skip: Vec<&Path> = ignored.iter().map(PathBuf::as_path).collect();
        skip.push(output_dir);

        let Some(found) = find_file_ignore_case(&self.source_dir, &self.exports, &skip) else {
            tracing::warn!(
                "no license file ({}) found in {}",
                self.exports.join(", "),
                self.source_dir.display()
            );
            return Ok(None);
        };

        let file_name = found
            .file_name()
            .context("license path has no file name")?;
        let relative = Path::new("licenses").join(file_name);
        copy_file(&found, &output_dir.join(&relative))?;
        tracing::debug!("bundled license {}", found.display());

        Ok(Some(relative))
    }

    fn install(&self, output_dir: &Path) -> Result<(), PackagingError> {
        let result = match self.install {
            InstallStrategy::CMake => {
                let build_dir = tempfile::Builder::new()
                    .prefix("tsl-release-install")
                    .tempdir()
                    .context("failed to create install build directory")?;
                cmake::install_project(&self.source_dir, build_dir.path(), output_dir)
            }
            InstallStrategy::Copy => self.copy_headers(output_dir),
        };

        result.map_err(|source| PackagingError::Install {
            package: self.name.clone(),
            source,
        })
    }

    /// Copy the configured header globs under `include/`, keeping each
    /// file's path relative to the fixed prefix of its glob.
    fn copy_headers(&self, output_dir: &Path) -> anyhow::Result<()> {
        let include_dir = output_dir.join("include");
        for pattern in &self.headers {
            let base = self.source_dir.join(glob_base(pattern));
            for file in glob_files(&self.source_dir, std::slice::from_ref(pattern))? {
                let dest = include_dir.join(relative_path(&base, &file));
                copy_file(&file, &dest)?;
            }
        }
        Ok(())
    }
}

/// The leading path components of a glob that contain no wildcard.
/// For a pattern without wildcards this is the parent directory.
fn glob_base(pattern: &str) -> PathBuf {
    let is_wild = |c: &str| c.contains(['*', '?', '[']);
    let components: Vec<&str> = pattern.split('/').collect();

    match components.iter().position(|c| is_wild(c)) {
        Some(idx) => components[..idx].iter().collect(),
        None => Path::new(pattern)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    }
}

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HEADER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}
