//! Integration test: clone and update a workspace from a local bare
//! repository.
//!
//! Requires Git. Skipped in normal `cargo test` runs unless the
//! `integration` feature is enabled.

#![cfg(feature = "integration")]

mod common;

use std::path::Path;
use std::process::Command;

use dropship::repo;
use dropship::{DeployConfig, DeployError, Target};
use secrecy::SecretString;

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Dropship Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .output()
        .expect("git not runnable");
    assert!(
        out.status.success(),
        "git {args:?}: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8(out.stdout).unwrap().trim().to_string()
}

/// A bare `origin.git` with one commit on `main` and one on `release`.
fn upstream(root: &Path) -> std::path::PathBuf {
    let origin = root.join("origin.git");
    let seed = root.join("seed");
    std::fs::create_dir_all(&origin).unwrap();
    std::fs::create_dir_all(&seed).unwrap();
    git(&origin, &["init", "--bare"]);
    git(&seed, &["init"]);
    common::write(&seed, "Dockerfile", "FROM alpine\n");
    git(&seed, &["add", "."]);
    git(&seed, &["commit", "-m", "initial"]);
    git(&seed, &["push", origin.to_str().unwrap(), "HEAD:main"]);
    git(&seed, &["checkout", "-b", "release"]);
    common::write(&seed, "VERSION", "1.0\n");
    git(&seed, &["add", "."]);
    git(&seed, &["commit", "-m", "release"]);
    git(&seed, &["push", origin.to_str().unwrap(), "HEAD:release"]);
    origin
}

fn config(root: &Path, origin: &Path, branch: &str) -> DeployConfig {
    let key = common::key_file(root);
    let target = Target::new("deploy", "203.0.113.10", key.to_str().unwrap()).unwrap();
    DeployConfig::new(
        origin.to_str().unwrap(),
        SecretString::from(String::new()),
        branch,
        target,
        Some(8000),
    )
    .unwrap()
}

#[test]
fn clone_lands_on_branch_tip() {
    let root = tempfile::tempdir().unwrap();
    let origin = upstream(root.path());
    let base = root.path().join("work");
    std::fs::create_dir(&base).unwrap();

    let workspace = repo::sync(&config(root.path(), &origin, ""), &base).unwrap();

    assert_eq!(workspace.path, base.join("origin"));
    assert_eq!(workspace.commit, git(&origin, &["rev-parse", "main"]));
    assert!(workspace.path.join("Dockerfile").is_file());
    assert!(!workspace.path.join("VERSION").exists());
}

#[test]
fn second_sync_is_stable() {
    let root = tempfile::tempdir().unwrap();
    let origin = upstream(root.path());
    let base = root.path().join("work");
    std::fs::create_dir(&base).unwrap();
    let config = config(root.path(), &origin, "main");

    let first = repo::sync(&config, &base).unwrap();
    let second = repo::sync(&config, &base).unwrap();

    assert_eq!(first.commit, second.commit);
}

#[test]
fn existing_workspace_moves_to_requested_branch() {
    let root = tempfile::tempdir().unwrap();
    let origin = upstream(root.path());
    let base = root.path().join("work");
    std::fs::create_dir(&base).unwrap();

    repo::sync(&config(root.path(), &origin, "main"), &base).unwrap();
    let workspace = repo::sync(&config(root.path(), &origin, "release"), &base).unwrap();

    assert_eq!(workspace.commit, git(&origin, &["rev-parse", "release"]));
    assert!(workspace.path.join("VERSION").is_file());
}

#[test]
fn origin_is_plain_url() {
    let root = tempfile::tempdir().unwrap();
    let origin = upstream(root.path());
    let base = root.path().join("work");
    std::fs::create_dir(&base).unwrap();

    let workspace = repo::sync(&config(root.path(), &origin, "main"), &base).unwrap();

    assert_eq!(
        git(&workspace.path, &["remote", "get-url", "origin"]),
        origin.to_str().unwrap()
    );
}

#[test]
fn non_git_directory_is_refused() {
    let root = tempfile::tempdir().unwrap();
    let origin = upstream(root.path());
    let base = root.path().join("work");
    std::fs::create_dir_all(base.join("origin")).unwrap();

    let err = repo::sync(&config(root.path(), &origin, "main"), &base).unwrap_err();

    assert!(matches!(err, DeployError::InvalidParameter(_)));
}
