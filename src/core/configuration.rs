//! A single point in the build matrix.

use std::fmt;

use serde::Serialize;

/// Compiler, architecture, build type and standard library of one build.
///
/// A value object: two configurations with the same fields are the same
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildConfiguration {
    pub compiler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
    pub arch: String,
    pub build_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libcxx: Option<String>,
}

impl BuildConfiguration {
    pub fn new(compiler: &str, arch: &str, build_type: &str) -> Self {
        BuildConfiguration {
            compiler: compiler.to_string(),
            compiler_version: None,
            arch: arch.to_string(),
            build_type: build_type.to_string(),
            libcxx: None,
        }
    }

    pub fn with_compiler_version(mut self, version: &str) -> Self {
        self.compiler_version = Some(version.to_string());
        self
    }

    pub fn with_libcxx(mut self, libcxx: &str) -> Self {
        self.libcxx = Some(libcxx.to_string());
        self
    }

    /// Look up a setting by its key, as used by `--filter`.
    pub fn setting(&self, key: &str) -> Option<&str> {
        match key {
            "compiler" => Some(&self.compiler),
            "compiler.version" => self.compiler_version.as_deref(),
            "arch" => Some(&self.arch),
            "build_type" => Some(&self.build_type),
            "compiler.libcxx" => self.libcxx.as_deref(),
            _ => None,
        }
    }

    /// Whether this compiler lets the standard library be chosen.
    pub fn compiler_has_libcxx(compiler: &str) -> bool {
        matches!(compiler, "gcc" | "clang" | "apple-clang")
    }

    /// Short, path-safe name, e.g. `gcc9-x86_64-release-libstdcxx11`.
    pub fn slug(&self) -> String {
        let mut parts = vec![format!(
            "{}{}",
            self.compiler,
            self.compiler_version.as_deref().unwrap_or("")
        )];
        parts.push(self.arch.clone());
        parts.push(self.build_type.to_lowercase());
        if let Some(libcxx) = &self.libcxx {
            parts.push(libcxx.replace('+', "x"));
        }
        parts.join("-")
    }
}

/// Setting keys accepted by [`BuildConfiguration::setting`].
pub const SETTING_KEYS: &[&str] = &[
    "compiler",
    "compiler.version",
    "arch",
    "build_type",
    "compiler.libcxx",
];

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.compiler)?;
        if let Some(v) = &self.compiler_version {
            write!(f, " {}", v)?;
        }
        write!(f, " {} {}", self.arch, self.build_type)?;
        if let Some(libcxx) = &self.libcxx {
            write!(f, " {}", libcxx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_slug() {
        let config = BuildConfiguration::new("gcc", "x86_64", "Release")
            .with_compiler_version("9")
            .with_libcxx("libstdc++11");

        assert_eq!(config.to_string(), "gcc 9 x86_64 Release libstdc++11");
        assert_eq!(config.slug(), "gcc9-x86_64-release-libstdcxx11");
    }

    #[test]
    fn test_setting_lookup() {
        let config = BuildConfiguration::new("msvc", "x86", "Debug");
        assert_eq!(config.setting("compiler"), Some("msvc"));
        assert_eq!(config.setting("build_type"), Some("Debug"));
        assert_eq!(config.setting("compiler.libcxx"), None);
        assert_eq!(config.setting("os"), None);
    }

    #[test]
    fn test_value_equality() {
        let a = BuildConfiguration::new("clang", "x86_64", "Release");
        let b = BuildConfiguration::new("clang", "x86_64", "Release");
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_libcxx("libc++"));
    }
}
