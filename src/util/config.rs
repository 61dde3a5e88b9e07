//! Configuration file support for tsl-release.
//!
//! Two locations are read:
//! - Global: `~/.tsl-release/config.toml` - user-wide defaults (publish account, login variables)
//! - Project: `release.toml` in the source root - package and matrix settings
//!
//! Project config takes precedence over global config. Every value has a
//! default matching the upstream hopscotch-map release scripts, so a
//! project without a `release.toml` still releases.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "release.toml";

/// tsl-release configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Package identity and staging
    pub package: PackageConfig,

    /// Build matrix axes
    pub matrix: MatrixConfig,

    /// Publishing settings
    pub publish: PublishConfig,

    /// Driver settings
    pub build: BuildConfig,
}

/// How headers get into the package directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStrategy {
    /// `cmake` configure + `cmake --install` into the package directory
    #[default]
    CMake,
    /// Copy the files matched by `package.headers` under `include/`
    Copy,
}

/// Package identity and staging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PackageConfig {
    pub name: String,
    pub url: String,
    pub license: String,
    pub description: String,

    /// Build metadata file the version is read from, relative to the source root
    pub metadata: PathBuf,

    /// Globs selecting the sources shipped with the recipe
    pub exports_sources: Vec<String>,

    /// License file names, matched case-insensitively
    pub exports: Vec<String>,

    /// Header-only packages have one identity for every build configuration
    pub header_only: bool,

    pub install: InstallStrategy,

    /// Header globs used by the `copy` install strategy
    pub headers: Vec<String>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        PackageConfig {
            name: "tsl-hopscotch-map".to_string(),
            url: "https://github.com/Tessil/hopscotch-map".to_string(),
            license: "MIT".to_string(),
            description:
                "C++ implementation of a fast hash map and hash set using hopscotch hashing."
                    .to_string(),
            metadata: PathBuf::from("CMakeLists.txt"),
            exports_sources: vec!["*".to_string()],
            exports: vec!["LICENSE".to_string()],
            header_only: true,
            install: InstallStrategy::CMake,
            headers: vec!["include/**/*".to_string()],
        }
    }
}

/// A compiler axis entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompilerAxis {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl CompilerAxis {
    pub fn new(name: &str, versions: &[&str]) -> Self {
        CompilerAxis {
            name: name.to_string(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Build matrix axes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatrixConfig {
    pub compilers: Vec<CompilerAxis>,
    pub archs: Vec<String>,
    pub build_types: Vec<String>,

    /// Standard library variants for compilers that have a selectable one
    pub libcxx: Vec<String>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        MatrixConfig {
            compilers: vec![
                CompilerAxis::new("gcc", &["9"]),
                CompilerAxis::new("clang", &["10"]),
            ],
            archs: vec!["x86_64".to_string(), "x86".to_string()],
            build_types: vec!["Release".to_string(), "Debug".to_string()],
            libcxx: vec!["libstdc++11".to_string(), "libstdc++".to_string()],
        }
    }
}

/// Publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PublishConfig {
    /// Account namespace on the remote, also the `user` part of the reference
    pub username: String,
    pub channel: String,

    /// Host plus any fixed path prefix, without scheme
    pub host: String,

    /// Artifact repository under the account
    pub repository: String,

    /// Local name of the remote
    pub remote: String,

    /// Environment variable whose non-empty value marks a release build
    pub trigger_env: String,

    pub login_env: String,
    pub password_env: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            username: "tessil".to_string(),
            channel: "stable".to_string(),
            host: "api.bintray.com/conan".to_string(),
            repository: "tsl".to_string(),
            remote: "upload_repo".to_string(),
            trigger_env: "TRAVIS_TAG".to_string(),
            login_env: "CONAN_LOGIN_USERNAME".to_string(),
            password_env: "CONAN_PASSWORD".to_string(),
        }
    }
}

/// Driver settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Consumer project built against each package, relative to the source root
    pub test_folder: PathBuf,

    /// Where packages are staged, relative to the source root
    pub output_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            test_folder: Path::new("conan").join("test_package"),
            output_dir: Path::new("target").join("release-packages"),
        }
    }
}

/// Raw sections of a config file, used for layering: only the keys a file
/// actually sets are present.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    package: toml::Table,
    matrix: toml::Table,
    publish: toml::Table,
    build: toml::Table,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Merge the keys explicitly set in `path` over this config.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let layer: ConfigLayer = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        let invalid = || format!("invalid value in config file: {}", path.display());
        self.package = overlay(&self.package, layer.package).with_context(invalid)?;
        self.matrix = overlay(&self.matrix, layer.matrix).with_context(invalid)?;
        self.publish = overlay(&self.publish, layer.publish).with_context(invalid)?;
        self.build = overlay(&self.build, layer.build).with_context(invalid)?;
        Ok(())
    }

    /// Merge a file, falling back to the current values if it cannot be parsed.
    pub fn merge_file_or_warn(&mut self, path: &Path) {
        let before = self.clone();
        if let Err(e) = self.merge_file(path) {
            tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
            *self = before;
        }
    }
}

/// Apply the keys of `table` on top of `base`.
fn overlay<T>(base: &T, table: toml::Table) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut merged = match toml::Value::try_from(base).context("failed to serialize config")? {
        toml::Value::Table(t) => t,
        other => bail!("config section serialized to {}", other.type_str()),
    };
    for (key, value) in table {
        merged.insert(key, value);
    }
    toml::Value::Table(merged)
        .try_into()
        .context("invalid config value")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`release.toml`)
/// 2. Global config (`~/.tsl-release/config.toml`)
/// 3. Defaults
///
/// A broken global file is skipped with a warning. A broken project file is
/// an error, since it decides where packages are published.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge_file_or_warn(global_path);
        }
    }

    if project_path.exists() {
        config.merge_file(project_path)?;
    }

    Ok(config)
}

/// Get the global config directory (`~/.tsl-release`).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".tsl-release"))
}

/// Get the global config path (`~/.tsl-release/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
