//! CMake adapter: installs the library headers and builds the test package.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::configuration::BuildConfiguration;
use crate::util::fs::ensure_dir;
use crate::util::process::{find_cmake, find_executable, ProcessBuilder};

/// CMake driver for one source tree and build directory.
#[derive(Debug, Clone)]
pub struct CMakeBuilder {
    cmake: PathBuf,
    source_dir: PathBuf,
    build_dir: PathBuf,
    cmake_args: Vec<String>,
    env: Vec<(String, String)>,
    build_type: String,
}

impl CMakeBuilder {
    /// Create a new CMake builder.
    pub fn new(source_dir: &Path, build_dir: &Path) -> Result<Self> {
        let Some(cmake) = find_cmake() else {
            bail!(
                "CMake not found\n\
                 \n\
                 CMake is required to install the headers and build the test package.\n\
                 Install CMake and ensure it's in your PATH, or set `install = \"copy\"`\n\
                 in the [package] section of release.toml."
            );
        };
        Ok(Self::with_program(cmake, source_dir, build_dir))
    }

    pub(crate) fn with_program(cmake: PathBuf, source_dir: &Path, build_dir: &Path) -> Self {
        CMakeBuilder {
            cmake,
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            cmake_args: Vec::new(),
            env: Vec::new(),
            build_type: "Release".to_string(),
        }
    }

    /// Add CMake arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cmake_args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Apply compiler, build type, architecture and standard library of a
    /// matrix configuration.
    pub fn for_configuration(mut self, config: &BuildConfiguration) -> Self {
        self.build_type = config.build_type.clone();

        if let Some((cc, cxx)) = compiler_executables(config) {
            self.env.push(("CC".to_string(), cc));
            self.env.push(("CXX".to_string(), cxx));
        }

        let flags = compiler_flags(config);
        if !flags.c.is_empty() {
            self.cmake_args
                .push(format!("-DCMAKE_C_FLAGS={}", flags.c.join(" ")));
        }
        if !flags.cxx.is_empty() {
            self.cmake_args
                .push(format!("-DCMAKE_CXX_FLAGS={}", flags.cxx.join(" ")));
        }

        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn command(&self) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake);
        for (key, value) in &self.env {
            cmd = cmd.env(key, value);
        }
        cmd
    }

    fn configure_command(&self) -> ProcessBuilder {
        self.command()
            .arg("-S")
            .arg(&self.source_dir)
            .arg("-B")
            .arg(&self.build_dir)
            .arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type))
            .args(&self.cmake_args)
    }

    /// Run CMake configuration.
    pub fn configure(&self) -> Result<()> {
        tracing::info!("Configuring {}", self.source_dir.display());
        ensure_dir(&self.build_dir)?;
        self.configure_command().exec_and_check()?;
        Ok(())
    }

    /// Run CMake build.
    pub fn compile(&self) -> Result<()> {
        tracing::info!("Building {}", self.source_dir.display());
        self.command()
            .arg("--build")
            .arg(&self.build_dir)
            .arg("--config")
            .arg(&self.build_type)
            .exec_and_check()?;
        Ok(())
    }

    /// Run `cmake --install` into `prefix`.
    pub fn install(&self, prefix: &Path) -> Result<()> {
        tracing::info!("Installing into {}", prefix.display());
        self.command()
            .arg("--install")
            .arg(&self.build_dir)
            .arg("--prefix")
            .arg(prefix)
            .arg("--config")
            .arg(&self.build_type)
            .exec_and_check()?;
        Ok(())
    }

    /// Find an executable the build produced, searching the places single-
    /// and multi-config generators put them.
    pub fn find_executable(&self, names: &[&str]) -> Option<PathBuf> {
        let search_dirs = [
            self.build_dir.clone(),
            self.build_dir.join("bin"),
            self.build_dir.join(&self.build_type),
        ];
        let suffix = std::env::consts::EXE_SUFFIX;

        search_dirs
            .iter()
            .flat_map(|dir| names.iter().map(move |n| dir.join(format!("{}{}", n, suffix))))
            .find(|p| p.is_file())
    }
}

/// Configure a CMake project and install it into `prefix`.
pub fn install_project(source_dir: &Path, build_dir: &Path, prefix: &Path) -> Result<()> {
    let cmake = CMakeBuilder::new(source_dir, build_dir)?
        .args([format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display())]);
    cmake.configure()?;
    cmake.install(prefix)
}

/// C and C++ compiler executables for a configuration, preferring
/// version-suffixed names (`gcc-9`) when they are on PATH.
pub fn compiler_executables(config: &BuildConfiguration) -> Option<(String, String)> {
    let (cc, cxx) = match config.compiler.as_str() {
        "gcc" => ("gcc", "g++"),
        "clang" | "apple-clang" => ("clang", "clang++"),
        _ => return None,
    };

    if let Some(version) = &config.compiler_version {
        let versioned_cc = format!("{}-{}", cc, version);
        let versioned_cxx = format!("{}-{}", cxx, version);
        if find_executable(&versioned_cc).is_some() && find_executable(&versioned_cxx).is_some() {
            return Some((versioned_cc, versioned_cxx));
        }
    }

    Some((cc.to_string(), cxx.to_string()))
}

/// Extra flags for the C and C++ compilers.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompilerFlags {
    pub c: Vec<String>,
    pub cxx: Vec<String>,
}

/// Flags implied by architecture (both languages) and standard library
/// (C++ only).
pub fn compiler_flags(config: &BuildConfiguration) -> CompilerFlags {
    let mut flags = CompilerFlags::default();
    if !BuildConfiguration::compiler_has_libcxx(&config.compiler) {
        return flags;
    }

    if config.arch == "x86" {
        flags.c.push("-m32".to_string());
        flags.cxx.push("-m32".to_string());
    }

    match config.libcxx.as_deref() {
        Some("libstdc++") => flags.cxx.push("-D_GLIBCXX_USE_CXX11_ABI=0".to_string()),
        Some("libstdc++11") => flags.cxx.push("-D_GLIBCXX_USE_CXX11_ABI=1".to_string()),
        Some("libc++") => flags.cxx.push("-stdlib=libc++".to_string()),
        _ => {}
    }

    flags
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}
