//! Per-configuration build: stage the package, then build and run the
//! consumer test package against it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::cmake::{is_cmake_project, CMakeBuilder};
use crate::core::configuration::BuildConfiguration;
use crate::core::errors::BuildError;
use crate::core::recipe::{PackageIdentity, PackageLayout, PackageRecipe};
use crate::util::process::ProcessBuilder;

/// Executable names a test package may produce.
const TEST_EXECUTABLES: &[&str] = &["test_package", "example"];

/// A package produced for one configuration.
#[derive(Debug, Clone)]
pub struct BuiltPackage {
    pub configuration: BuildConfiguration,
    pub identity: PackageIdentity,
    pub layout: PackageLayout,
}

/// Builds, packages and tests a single matrix configuration.
pub trait ConfigurationBuilder {
    fn build(
        &mut self,
        recipe: &PackageRecipe,
        config: &BuildConfiguration,
    ) -> Result<BuiltPackage, BuildError>;
}

/// Builds on the local machine, staging packages under `output_root`.
#[derive(Debug, Clone)]
pub struct LocalBuilder {
    output_root: PathBuf,
    test_folder: Option<PathBuf>,
}

impl LocalBuilder {
    pub fn new(output_root: PathBuf) -> Self {
        LocalBuilder {
            output_root,
            test_folder: None,
        }
    }

    /// Build and run the consumer project in `dir` for every configuration.
    pub fn with_test_folder(mut self, dir: Option<PathBuf>) -> Self {
        self.test_folder = dir;
        self
    }

    /// Package directory for an identity.
    pub fn package_dir(&self, identity: &PackageIdentity) -> PathBuf {
        self.output_root.join(&identity.as_str()[..16])
    }

    fn test_package(
        &self,
        test_folder: &Path,
        package_dir: &Path,
        config: &BuildConfiguration,
    ) -> Result<()> {
        let build_dir = tempfile::Builder::new()
            .prefix(&format!("tsl-release-test-{}-", config.slug()))
            .tempdir()
            .context("failed to create test build directory")?;

        let cmake = CMakeBuilder::new(test_folder, build_dir.path())?
            .for_configuration(config)
            .args([format!("-DCMAKE_PREFIX_PATH={}", package_dir.display())]);
        cmake.configure()?;
        cmake.compile()?;

        match cmake.find_executable(TEST_EXECUTABLES) {
            Some(exe) => {
                tracing::info!("Running {}", exe.display());
                ProcessBuilder::new(&exe)
                    .cwd(cmake.build_dir())
                    .exec_and_check()?;
            }
            None => tracing::warn!(
                "test package built but produced none of: {}",
                TEST_EXECUTABLES.join(", ")
            ),
        }

        Ok(())
    }
}

impl ConfigurationBuilder for LocalBuilder {
    fn build(
        &mut self,
        recipe: &PackageRecipe,
        config: &BuildConfiguration,
    ) -> Result<BuiltPackage, BuildError> {
        tracing::info!("Building {} for {}", recipe.name(), config);

        let identity = recipe.compute_identity(config);
        let package_dir = self.package_dir(&identity);

        let layout = recipe
            .package(&package_dir)
            .map_err(|source| BuildError::Packaging {
                configuration: config.to_string(),
                source,
            })?;

        match &self.test_folder {
            Some(dir) if is_cmake_project(dir) => {
                self.test_package(dir, &package_dir, config)
                    .map_err(|source| BuildError::TestPackage {
                        configuration: config.to_string(),
                        source,
                    })?;
            }
            Some(dir) => tracing::warn!(
                "test folder {} has no CMakeLists.txt, skipping test package",
                dir.display()
            ),
            None => tracing::debug!("no test package configured"),
        }

        Ok(BuiltPackage {
            configuration: config.clone(),
            identity,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::{InstallStrategy, PackageConfig};
    use std::fs;
    use tempfile::TempDir;

    fn recipe(dir: &Path, with_headers: bool) -> PackageRecipe {
        fs::write(dir.join("LICENSE"), "MIT").unwrap();
        if with_headers {
            fs::create_dir_all(dir.join("include/tsl")).unwrap();
            fs::write(dir.join("include/tsl/hopscotch_map.h"), "#pragma once\n").unwrap();
        }
        let config = PackageConfig {
            install: InstallStrategy::Copy,
            ..PackageConfig::default()
        };
        PackageRecipe::with_version(dir, &config, Some("2.0.0".to_string()))
    }

    #[test]
    fn test_local_builder_stages_by_identity() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let recipe = recipe(src.path(), true);
        let mut builder = LocalBuilder::new(out.path().to_path_buf());

        let a = builder
            .build(&recipe, &BuildConfiguration::new("gcc", "x86_64", "Release"))
            .unwrap();
        let b = builder
            .build(&recipe, &BuildConfiguration::new("clang", "x86", "Debug"))
            .unwrap();

        assert_eq!(a.identity, b.identity);
        assert_eq!(a.layout.root, b.layout.root);
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
        assert!(a.layout.root.join("include/tsl/hopscotch_map.h").is_file());
    }

    #[test]
    fn test_missing_headers_is_a_build_error() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let recipe = recipe(src.path(), false);
        let mut builder = LocalBuilder::new(out.path().to_path_buf());

        let err = builder
            .build(&recipe, &BuildConfiguration::new("gcc", "x86_64", "Release"))
            .unwrap_err();
        assert!(matches!(err, BuildError::Packaging { .. }));
    }

    #[test]
    fn test_test_folder_without_cmake_is_skipped() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let test_folder = src.path().join("conan/test_package");
        fs::create_dir_all(&test_folder).unwrap();

        let recipe = recipe(src.path(), true);
        let mut builder =
            LocalBuilder::new(out.path().to_path_buf()).with_test_folder(Some(test_folder));

        assert!(builder
            .build(&recipe, &BuildConfiguration::new("gcc", "x86_64", "Release"))
            .is_ok());
    }
}
