use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{DeployError, DeployResult};
use crate::ssh::SshSession;

pub const DEFAULT_BRANCH: &str = "main";

/// Names and limits used on the remote host.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use dropship::Settings;
///
/// let settings = Settings::new()
///     .container_name("shop")
///     .image("shop:latest")
///     .build_timeout(Some(Duration::from_secs(600)));
///
/// assert_eq!(settings.site_name, "app");
/// assert_eq!(settings.remote_dir, "~/app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub container_name: String,
    pub image: String,
    pub site_name: String,
    pub remote_dir: String,
    /// Seconds allowed for the SSH handshake.
    pub connect_timeout: u32,
    /// Bound on the bootstrap and build/run phases. `None` waits
    /// forever.
    pub build_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            container_name: "app".to_string(),
            image: "myapp:latest".to_string(),
            site_name: "app".to_string(),
            remote_dir: "~/app".to_string(),
            connect_timeout: 10,
            build_timeout: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn container_name(mut self, name: &str) -> Self {
        self.container_name = name.to_string();
        self
    }

    #[must_use]
    pub fn image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }

    #[must_use]
    pub fn site_name(mut self, name: &str) -> Self {
        self.site_name = name.to_string();
        self
    }

    #[must_use]
    pub fn remote_dir(mut self, dir: &str) -> Self {
        self.remote_dir = dir.to_string();
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, seconds: u32) -> Self {
        self.connect_timeout = seconds;
        self
    }

    #[must_use]
    pub const fn build_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.build_timeout = timeout;
        self
    }

    /// Reject names that would make remote commands destructive or
    /// meaningless.
    pub fn validate(&self) -> DeployResult<()> {
        if self.container_name.trim().is_empty() {
            return Err(invalid("container name is empty"));
        }
        if self.image.trim().is_empty() {
            return Err(invalid("image tag is empty"));
        }
        if self.site_name.trim().is_empty() || self.site_name.contains('/') {
            return Err(invalid("site name must be a plain file name"));
        }
        if self.connect_timeout == 0 {
            return Err(invalid("connect timeout must be at least one second"));
        }
        if !is_safe_remote_dir(&self.remote_dir) {
            return Err(invalid(&format!(
                "refusing remote directory '{}'",
                self.remote_dir
            )));
        }
        Ok(())
    }
}

/// The deployment directory is wiped with `rm -rf` on every run. It
/// must sit strictly below `$HOME` or be at least two levels deep,
/// and never be a `/home/<user>` directory. `..` is not allowed
/// anywhere.
#[must_use]
pub fn is_safe_remote_dir(dir: &str) -> bool {
    let dir = dir.trim();
    let (relative_to_home, rest) = match dir.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => (true, rest),
        Some(_) => return false,
        None => (!dir.starts_with('/'), dir),
    };

    let segments: Vec<&str> = rest
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.contains(&"..") {
        return false;
    }

    if relative_to_home {
        !segments.is_empty()
    } else {
        !matches!(segments.as_slice(), [] | [_] | ["home", _])
    }
}

/// The remote login: who, where, and with which key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user: String,
    pub host: String,
    pub key: PathBuf,
}

impl Target {
    /// Validate the login. The key must be an existing file; a
    /// leading `~/` is expanded against `$HOME`. A missing key is
    /// reported ahead of any other problem.
    pub fn new(user: &str, host: &str, key: &str) -> DeployResult<Self> {
        let key = expand_home(key.trim());
        if !key.is_file() {
            return Err(DeployError::MissingKey(key));
        }

        let user = user.trim();
        let host = host.trim();
        if user.is_empty() {
            return Err(invalid("remote username is empty"));
        }
        if host.is_empty() {
            return Err(invalid("remote host is empty"));
        }

        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
            key,
        })
    }

    #[must_use]
    pub fn session(&self, settings: &Settings) -> SshSession {
        SshSession::new(&self.host, &self.user)
            .with_key(&self.key)
            .connect_timeout(settings.connect_timeout)
    }
}

/// Everything one deploy run needs. Built once, then only borrowed.
#[derive(Debug)]
pub struct DeployConfig {
    pub repo_url: String,
    pub token: SecretString,
    pub branch: String,
    pub target: Target,
    /// `None` when left blank at intake.
    pub port: Option<u16>,
    pub settings: Settings,
}

impl DeployConfig {
    /// A blank `branch` becomes [`DEFAULT_BRANCH`].
    pub fn new(
        repo_url: &str,
        token: SecretString,
        branch: &str,
        target: Target,
        port: Option<u16>,
    ) -> DeployResult<Self> {
        let repo_url = repo_url.trim();
        if repo_url.is_empty() {
            return Err(invalid("repository URL is empty"));
        }

        Ok(Self {
            repo_url: repo_url.to_string(),
            token,
            branch: branch_or_default(branch),
            target,
            port,
            settings: Settings::default(),
        })
    }

    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// The access token, or `None` for anonymous clones.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        let token = self.token.expose_secret();
        (!token.is_empty()).then_some(token)
    }

    /// The application port, required from the build phase on.
    pub const fn require_port(&self) -> DeployResult<u16> {
        match self.port {
            Some(port) => Ok(port),
            None => Err(DeployError::EmptyPort),
        }
    }
}

/// Login and names for a teardown run.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub target: Target,
    pub settings: Settings,
}

impl CleanupConfig {
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            target,
            settings: Settings::default(),
        }
    }

    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

#[must_use]
pub fn branch_or_default(raw: &str) -> String {
    let branch = raw.trim();
    if branch.is_empty() {
        DEFAULT_BRANCH.to_string()
    } else {
        branch.to_string()
    }
}

/// Parse the port answer. Blank means "not given"; anything else
/// must be a port number in 1-65535.
pub fn parse_port(raw: &str) -> DeployResult<Option<u16>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid(&format!("'{raw}' is not a valid port"))),
        Ok(port) => Ok(Some(port)),
    }
}

#[must_use]
pub fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(raw),
    }
}

fn invalid(message: &str) -> DeployError {
    DeployError::InvalidParameter(message.to_string())
}
