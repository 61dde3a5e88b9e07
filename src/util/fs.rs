//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy a file, creating parent directories of `dst` if needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).with_context(|| {
        format!("failed to copy {} to {}", src.display(), dst.display())
    })?;
    Ok(())
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in
            glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Walk `root` and return the first file whose name equals one of `names`,
/// ignoring ASCII case. Entries are visited in sorted order so the result is
/// stable. Directories named in `skip` are not descended into.
pub fn find_file_ignore_case(root: &Path, names: &[String], skip: &[&Path]) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !skip.iter().any(|s| e.path() == *s))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            let file_name = e.file_name().to_string_lossy();
            names.iter().any(|n| n.eq_ignore_ascii_case(&file_name))
        })
        .map(|e| e.into_path())
}

/// All regular files under `root`, sorted, as paths relative to `root`.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(relative_path(root, entry.path()));
        }
    }
    Ok(files)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        let include = tmp.path().join("include/tsl");
        fs::create_dir_all(&include).unwrap();
        fs::write(include.join("hopscotch_map.h"), "").unwrap();
        fs::write(include.join("hopscotch_set.h"), "").unwrap();
        fs::write(tmp.path().join("README.md"), "readme").unwrap();

        let files = glob_files(tmp.path(), &["include/**/*.h".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_find_file_ignore_case_prefers_sorted_first() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("License"), "first").unwrap();
        fs::write(tmp.path().join("b/LICENSE"), "second").unwrap();

        let found =
            find_file_ignore_case(tmp.path(), &["LICENSE".to_string()], &[]).unwrap();
        assert_eq!(found, tmp.path().join("License"));
    }

    #[test]
    fn test_find_file_ignore_case_skips_dirs() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("LICENSE"), "").unwrap();

        assert!(find_file_ignore_case(tmp.path(), &["license".to_string()], &[&build]).is_none());
    }

    #[test]
    fn test_list_files_relative_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("include")).unwrap();
        fs::write(tmp.path().join("include/b.h"), "").unwrap();
        fs::write(tmp.path().join("include/a.h"), "").unwrap();

        let files = list_files(tmp.path()).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("include/a.h"), PathBuf::from("include/b.h")]
        );
    }
}
