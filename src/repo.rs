use std::path::{Path, PathBuf};

use tracing::info;

use crate::cmd::{self, Opts};
use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};

// Fail on bad credentials instead of waiting for a password.
const GIT_ENV: &[(&str, &str)] = &[("GIT_TERMINAL_PROMPT", "0")];

/// A local working copy pinned to the deployed branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub path: PathBuf,
    /// `HEAD` after the sync.
    pub commit: String,
}

/// Directory name for a repository URL: its last path segment
/// without `.git`.
pub fn workspace_name(repo_url: &str) -> DeployResult<String> {
    let trimmed = repo_url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() || name == "." || name == ".." {
        return Err(DeployError::InvalidParameter(format!(
            "cannot derive a directory name from '{repo_url}'"
        )));
    }
    Ok(name.to_string())
}

/// Embed `token` as the user part of an `https://` URL. Other URL
/// schemes are returned unchanged.
#[must_use]
pub fn authenticated_url(repo_url: &str, token: Option<&str>) -> String {
    let (Some(token), Some(rest)) = (token, repo_url.strip_prefix("https://")) else {
        return repo_url.to_string();
    };

    let authority_end = rest.find('/').unwrap_or(rest.len());
    let rest = match rest[..authority_end].rfind('@') {
        Some(at) => &rest[at + 1..],
        None => rest,
    };
    format!("https://{token}@{rest}")
}

/// Clone or update the workspace under `base` so that `HEAD` is the
/// tip of the configured branch.
///
/// The token only ever appears in the URL passed on the command line;
/// the workspace's `origin` stays the plain URL.
pub fn sync(config: &DeployConfig, base: &Path) -> DeployResult<Workspace> {
    let path = base.join(workspace_name(&config.repo_url)?);
    let dir = path.display().to_string();
    let url = authenticated_url(&config.repo_url, config.token());
    let branch = config.branch.as_str();
    let opts = Opts {
        env: GIT_ENV,
        secret: config.token(),
        ..Opts::default()
    };

    if path.join(".git").exists() {
        info!(workspace = %dir, %branch, "updating existing workspace");
        cmd::stream("git", &["-C", &dir, "fetch", &url, branch], &opts, None)?;
        cmd::stream(
            "git",
            &["-C", &dir, "checkout", "-B", branch, "FETCH_HEAD"],
            &opts,
            None,
        )?;
    } else if path.exists() {
        return Err(DeployError::InvalidParameter(format!(
            "{dir} exists but is not a git working copy"
        )));
    } else {
        info!(workspace = %dir, %branch, repo = %config.repo_url, "cloning repository");
        cmd::stream(
            "git",
            &["clone", "--branch", branch, &url, &dir],
            &opts,
            None,
        )?;
        cmd::run_with(
            "git",
            &["-C", &dir, "remote", "set-url", "origin", &config.repo_url],
            &opts,
        )?;
    }

    let commit = cmd::run_with("git", &["-C", &dir, "rev-parse", "HEAD"], &opts)?;
    info!(%commit, %branch, "workspace at branch tip");

    Ok(Workspace { path, commit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_https_url() {
        assert_eq!(
            workspace_name("https://github.com/acme/shop.git").unwrap(),
            "shop"
        );
        assert_eq!(
            workspace_name("https://github.com/acme/shop/").unwrap(),
            "shop"
        );
    }

    #[test]
    fn name_from_scp_style_url() {
        assert_eq!(workspace_name("git@github.com:shop.git").unwrap(), "shop");
    }

    #[test]
    fn name_rejects_empty() {
        assert!(workspace_name("").is_err());
        assert!(workspace_name("https://example.com/.git").is_err());
    }

    #[test]
    fn token_inserted_into_https_url() {
        assert_eq!(
            authenticated_url("https://github.com/acme/shop.git", Some("ghp_x")),
            "https://ghp_x@github.com/acme/shop.git"
        );
    }

    #[test]
    fn existing_user_info_replaced() {
        assert_eq!(
            authenticated_url("https://bob@github.com/acme/shop.git", Some("t")),
            "https://t@github.com/acme/shop.git"
        );
    }

    #[test]
    fn url_untouched_without_token_or_https() {
        assert_eq!(
            authenticated_url("https://github.com/a/b", None),
            "https://github.com/a/b"
        );
        assert_eq!(
            authenticated_url("git@github.com:a/b.git", Some("t")),
            "git@github.com:a/b.git"
        );
    }
}
