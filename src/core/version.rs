//! Version resolution from build metadata.
//!
//! The library version lives in the `project(<name> VERSION <value>)`
//! directive of its `CMakeLists.txt`. Resolution never fails: any problem
//! yields `None`, which is rendered as `unknown`.

use std::path::Path;

use regex::Regex;

/// Display form of an unresolved version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Read `path` and return the version declared for `project`.
///
/// With `project` set to `None`, the first `project(...)` directive carrying
/// a `VERSION` wins regardless of its name.
pub fn resolve_version(path: &Path, project: Option<&str>) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("could not read {}: {}", path.display(), e);
            return None;
        }
    };

    let version = parse_project_version(&content, project);
    match &version {
        Some(v) => {
            if semver::Version::parse(v).is_err() {
                tracing::warn!("version `{}` in {} is not semver", v, path.display());
            }
            tracing::debug!("resolved version {} from {}", v, path.display());
        }
        None => tracing::warn!("no project version directive in {}", path.display()),
    }
    version
}

/// Extract the version from the text of a build metadata file.
pub fn parse_project_version(content: &str, project: Option<&str>) -> Option<String> {
    let name = match project {
        Some(name) => regex::escape(name),
        None => r"[^\s)]+".to_string(),
    };
    let pattern = format!(r"\b(?i:project)\(\s*{}\s+VERSION\s+([^\s)]+)[^)]*\)", name);
    let re = Regex::new(&pattern).ok()?;

    re.captures(content)
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Render an optional version for humans.
pub fn display_version(version: Option<&str>) -> &str {
    version.unwrap_or(UNKNOWN_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_named_project() {
        assert_eq!(
            parse_project_version("project(foo VERSION 1.2.3)", Some("foo")),
            Some("1.2.3".to_string())
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let content = "cmake_minimum_required(VERSION 3.1)\nproject(tsl-hopscotch-map VERSION   2.3.0 )\n";
        assert_eq!(
            parse_project_version(content, Some("tsl-hopscotch-map")),
            Some("2.3.0".to_string())
        );
    }

    #[test]
    fn test_parse_ignores_other_project_names() {
        assert_eq!(parse_project_version("project(bar VERSION 1.0.0)", Some("foo")), None);
    }

    #[test]
    fn test_parse_any_project() {
        let content = "project(bar VERSION 0.4.1 LANGUAGES CXX)";
        assert_eq!(parse_project_version(content, None), Some("0.4.1".to_string()));
    }

    #[test]
    fn test_minimum_required_is_not_a_project_version() {
        assert_eq!(
            parse_project_version("cmake_minimum_required(VERSION 3.1)\nproject(foo)\n", None),
            None
        );
    }

    #[test]
    fn test_non_semver_version_is_kept() {
        let content = "project(foo VERSION 1.2.3.4)\n";
        assert_eq!(
            parse_project_version(content, Some("foo")),
            Some("1.2.3.4".to_string())
        );
    }

    #[test]
    fn test_resolve_version_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("CMakeLists.txt");
        std::fs::write(&path, "project(foo VERSION 1.2.3)\n").unwrap();

        assert_eq!(resolve_version(&path, Some("foo")), Some("1.2.3".to_string()));
    }

    #[test]
    fn test_resolve_four_component_version() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("CMakeLists.txt");
        std::fs::write(&path, "project(foo VERSION 1.2.3.4 LANGUAGES CXX)\n").unwrap();

        assert_eq!(resolve_version(&path, Some("foo")), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn test_missing_file_is_unknown() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("CMakeLists.txt");

        assert_eq!(resolve_version(&path, Some("foo")), None);
        assert_eq!(display_version(None), "unknown");
    }

    #[test]
    fn test_missing_directive_is_unknown() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("CMakeLists.txt");
        std::fs::write(&path, "add_library(foo INTERFACE)\n").unwrap();

        assert_eq!(resolve_version(&path, None), None);
    }
}
