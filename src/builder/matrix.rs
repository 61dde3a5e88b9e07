//! Build matrix generation and narrowing.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::core::configuration::{BuildConfiguration, SETTING_KEYS};
use crate::util::config::MatrixConfig;

/// Ordered set of configurations to build.
///
/// Narrowing consumes the matrix and returns a new one; execution takes it
/// by value, so a matrix cannot change while it is being built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildMatrix {
    configurations: Vec<BuildConfiguration>,
}

impl BuildMatrix {
    pub fn new(configurations: Vec<BuildConfiguration>) -> Self {
        BuildMatrix { configurations }
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuildConfiguration> {
        self.configurations.iter()
    }

    pub fn first(&self) -> Option<&BuildConfiguration> {
        self.configurations.first()
    }

    /// Apply a caller-supplied reduction.
    pub fn narrow<F>(self, f: F) -> Self
    where
        F: FnOnce(Vec<BuildConfiguration>) -> Vec<BuildConfiguration>,
    {
        BuildMatrix::new(f(self.configurations))
    }

    /// Keep only the first configuration.
    pub fn first_only(self) -> Self {
        self.narrow(|mut configs| {
            configs.truncate(1);
            configs
        })
    }

    /// Keep configurations matching the filters. Filters on the same key are
    /// alternatives; filters on different keys must all match.
    pub fn filter(self, filters: &[MatrixFilter]) -> Self {
        if filters.is_empty() {
            return self;
        }

        let mut by_key: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for f in filters {
            by_key.entry(&f.key).or_default().push(&f.value);
        }

        self.narrow(|configs| {
            configs
                .into_iter()
                .filter(|c| {
                    by_key
                        .iter()
                        .all(|(key, values)| c.setting(key).is_some_and(|v| values.contains(&v)))
                })
                .collect()
        })
    }
}

impl IntoIterator for BuildMatrix {
    type Item = BuildConfiguration;
    type IntoIter = std::vec::IntoIter<BuildConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.configurations.into_iter()
    }
}

/// Cross product of the configured axes, in axis order:
/// compiler, compiler version, arch, build type, standard library.
pub fn generate_default_matrix(axes: &MatrixConfig) -> BuildMatrix {
    let mut configurations = Vec::new();

    for compiler in &axes.compilers {
        let versions: Vec<Option<&str>> = if compiler.versions.is_empty() {
            vec![None]
        } else {
            compiler.versions.iter().map(|v| Some(v.as_str())).collect()
        };

        let libcxx: Vec<Option<&str>> =
            if BuildConfiguration::compiler_has_libcxx(&compiler.name) && !axes.libcxx.is_empty() {
                axes.libcxx.iter().map(|l| Some(l.as_str())).collect()
            } else {
                vec![None]
            };

        for version in &versions {
            for arch in &axes.archs {
                for build_type in &axes.build_types {
                    for lib in &libcxx {
                        let mut config = BuildConfiguration::new(&compiler.name, arch, build_type);
                        if let Some(v) = version {
                            config = config.with_compiler_version(v);
                        }
                        if let Some(l) = lib {
                            config = config.with_libcxx(l);
                        }
                        configurations.push(config);
                    }
                }
            }
        }
    }

    BuildMatrix::new(configurations)
}

/// A `key=value` restriction on the matrix, e.g. `build_type=Release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixFilter {
    pub key: String,
    pub value: String,
}

impl FromStr for MatrixFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("invalid filter '{}'; expected KEY=VALUE", s))?;
        let key = key.trim();
        let value = value.trim();

        if !SETTING_KEYS.contains(&key) {
            return Err(format!(
                "unknown setting '{}'; expected one of: {}",
                key,
                SETTING_KEYS.join(", ")
            ));
        }
        if value.is_empty() {
            return Err(format!("filter '{}' has an empty value", s));
        }

        Ok(MatrixFilter {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}
