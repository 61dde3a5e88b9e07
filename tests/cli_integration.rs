//! CLI integration tests for tsl-release.
//!
//! These tests drive the binary against a throwaway library tree that uses
//! the `copy` install strategy, so no CMake or network is needed.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the tsl-release binary command, isolated from the caller's release
/// environment and global config.
fn tsl_release(source: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tsl-release").unwrap();
    cmd.arg("--source")
        .arg(source)
        .env("HOME", source)
        .env_remove("TRAVIS_TAG")
        .env_remove("CONAN_LOGIN_USERNAME")
        .env_remove("CONAN_PASSWORD")
        .env_remove("TSL_RELEASE_CONFIG")
        .env_remove("TSL_RELEASE_SOURCE");
    cmd
}

/// Create a header-only library with the given version.
fn library(version: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    fs::write(
        root.join("CMakeLists.txt"),
        format!(
            "cmake_minimum_required(VERSION 3.1)\nproject(tsl-hopscotch-map VERSION {})\n",
            version
        ),
    )
    .unwrap();
    fs::write(root.join("LICENSE"), "MIT License\n").unwrap();
    fs::create_dir_all(root.join("include/tsl")).unwrap();
    fs::write(root.join("include/tsl/hopscotch_map.h"), "#pragma once\n").unwrap();
    fs::write(
        root.join("release.toml"),
        r#"
[package]
install = "copy"
headers = ["include/**/*.h"]
"#,
    )
    .unwrap();

    tmp
}

fn staged_packages(root: &Path) -> usize {
    let dir = root.join("target/release-packages");
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir).unwrap().count()
}

// ============================================================================
// tsl-release version
// ============================================================================

#[test]
fn test_version_prints_resolved_version() {
    let lib = library("2.3.0");

    tsl_release(lib.path())
        .arg("version")
        .assert()
        .success()
        .stdout("2.3.0\n");
}

#[test]
fn test_version_unknown_is_not_an_error() {
    let lib = library("2.3.0");
    fs::remove_file(lib.path().join("CMakeLists.txt")).unwrap();

    tsl_release(lib.path())
        .arg("version")
        .assert()
        .success()
        .stdout("unknown\n");
}

// ============================================================================
// tsl-release info / matrix
// ============================================================================

#[test]
fn test_info_json() {
    let lib = library("1.0.0");

    tsl_release(lib.path())
        .args(["info", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"tsl-hopscotch-map\""))
        .stdout(predicate::str::contains("\"version\": \"1.0.0\""))
        .stdout(predicate::str::contains("\"license\": \"MIT\""))
        .stdout(predicate::str::contains("\"exported_files\""));
}

#[test]
fn test_info_lists_exported_files() {
    let lib = library("1.0.0");

    tsl_release(lib.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("exported:    3 file(s)"))
        .stdout(predicate::str::contains("  CMakeLists.txt\n"))
        .stdout(predicate::str::contains("  LICENSE\n"));
}

#[test]
fn test_matrix_is_narrowed_for_header_only() {
    let lib = library("1.0.0");

    tsl_release(lib.path())
        .arg("matrix")
        .assert()
        .success()
        .stdout("gcc 9 x86_64 Release libstdc++11\n")
        .stderr(predicate::str::contains("1 of 16 configurations"));
}

#[test]
fn test_matrix_full_with_filter() {
    let lib = library("1.0.0");

    let output = tsl_release(lib.path())
        .args(["matrix", "--full-matrix", "--filter", "compiler=clang", "--filter", "arch=x86"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.lines().all(|l| l.starts_with("clang 10 x86 ")));
}

#[test]
fn test_matrix_rejects_unknown_filter_key() {
    let lib = library("1.0.0");

    tsl_release(lib.path())
        .args(["matrix", "--filter", "os=Linux"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown setting 'os'"));
}

// ============================================================================
// tsl-release package
// ============================================================================

#[test]
fn test_package_stages_headers_and_license() {
    let lib = library("1.0.0");
    let out = TempDir::new().unwrap();
    let pkg = out.path().join("pkg");

    tsl_release(lib.path())
        .arg("package")
        .arg(&pkg)
        .assert()
        .success();

    assert!(pkg.join("include/tsl/hopscotch_map.h").is_file());
    assert!(pkg.join("licenses/LICENSE").is_file());
}

#[test]
fn test_package_without_headers_fails() {
    let lib = library("1.0.0");
    fs::remove_dir_all(lib.path().join("include")).unwrap();
    let out = TempDir::new().unwrap();

    tsl_release(lib.path())
        .arg("package")
        .arg(out.path().join("pkg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no headers found"));
}

#[test]
fn test_package_refuses_directory_inside_sources() {
    let lib = library("1.0.0");

    tsl_release(lib.path())
        .arg("package")
        .arg(lib.path().join("include"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to stage"));

    assert!(lib.path().join("include/tsl/hopscotch_map.h").is_file());
}

// ============================================================================
// configuration files
// ============================================================================

#[test]
fn test_missing_explicit_config_fails() {
    let lib = library("1.0.0");

    tsl_release(lib.path())
        .arg("--config")
        .arg(lib.path().join("does-not-exist.toml"))
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_broken_project_config_fails() {
    let lib = library("1.0.0");
    fs::write(
        lib.path().join("release.toml"),
        "[publish]\nusername = \"acme\"\nrepository = 5\n",
    )
    .unwrap();

    tsl_release(lib.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("release.toml"));

    assert_eq!(staged_packages(lib.path()), 0);
}

// ============================================================================
// tsl-release run
// ============================================================================

#[test]
fn test_run_with_empty_trigger_skips_upload() {
    let lib = library("2.0.0");

    tsl_release(lib.path())
        .arg("run")
        .env("TRAVIS_TAG", "")
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping upload (no release trigger)"));
}

#[test]
fn test_run_without_trigger_builds_once_and_skips_upload() {
    let lib = library("2.0.0");

    tsl_release(lib.path())
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains("Built 1 configuration(s)"))
        .stderr(predicate::str::contains("Skipping upload (no release trigger)"))
        .stderr(predicate::str::contains("Uploaded").not());

    assert_eq!(staged_packages(lib.path()), 1);
}

#[test]
fn test_run_full_matrix_stages_one_package() {
    let lib = library("2.0.0");

    tsl_release(lib.path())
        .args(["run", "--full-matrix"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Built 16 configuration(s)"));

    assert_eq!(staged_packages(lib.path()), 1);
}

#[test]
fn test_run_dry_run_ignores_trigger() {
    let lib = library("2.0.0");

    tsl_release(lib.path())
        .args(["run", "--dry-run"])
        .env("TRAVIS_TAG", "v2.0.0")
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping upload (dry run)"));
}

#[test]
fn test_run_with_trigger_requires_credentials() {
    let lib = library("2.0.0");

    tsl_release(lib.path())
        .arg("run")
        .env("TRAVIS_TAG", "v2.0.0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONAN_LOGIN_USERNAME"));
}

#[test]
fn test_run_fails_when_headers_missing() {
    let lib = library("2.0.0");
    fs::remove_dir_all(lib.path().join("include")).unwrap();

    tsl_release(lib.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("packaging failed"));
}

#[test]
fn test_completions() {
    let lib = library("1.0.0");

    tsl_release(lib.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tsl-release"));
}
