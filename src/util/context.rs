//! Process-wide context for a release run.
//!
//! Resolves the source root, locates the config files and owns the merged
//! [`Config`]. Built once in the CLI and passed down by reference.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::util::config::{self, load_config, Config, PROJECT_CONFIG_FILE};

/// Global context for tsl-release operations.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    source_dir: PathBuf,
    config: Config,
}

impl GlobalContext {
    /// Create a context rooted at `source_dir`, optionally with an explicit
    /// project config file instead of `<source_dir>/release.toml`.
    pub fn with_source_dir(source_dir: PathBuf, config_file: Option<PathBuf>) -> Result<Self> {
        Self::with_config_paths(source_dir, config_file, config::global_config_path())
    }

    /// Like [`GlobalContext::with_source_dir`], with the global config file
    /// given explicitly (`None` skips it).
    pub fn with_config_paths(
        source_dir: PathBuf,
        config_file: Option<PathBuf>,
        global_config: Option<PathBuf>,
    ) -> Result<Self> {
        let source_dir = source_dir
            .canonicalize()
            .with_context(|| format!("source directory not found: {}", source_dir.display()))?;

        let project_config = match config_file {
            Some(path) if !path.is_file() => {
                bail!("config file not found: {}", path.display())
            }
            Some(path) => path,
            None => source_dir.join(PROJECT_CONFIG_FILE),
        };
        let config = load_config(global_config.as_deref(), &project_config)?;

        tracing::debug!(
            "source root {} (config: {})",
            source_dir.display(),
            project_config.display()
        );

        Ok(GlobalContext { source_dir, config })
    }

    /// Get the library source root.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory where packages are staged.
    pub fn output_dir(&self) -> PathBuf {
        self.source_dir.join(&self.config.build.output_dir)
    }

    /// Consumer project built against each package, if the source tree has one.
    pub fn test_folder(&self) -> Option<PathBuf> {
        let dir = self.source_dir.join(&self.config.build.test_folder);
        dir.is_dir().then_some(dir)
    }
}
