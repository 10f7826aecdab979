use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("remote command failed ({}): {command}{}", exit_label(*code), stderr_suffix(stderr))]
    RemoteFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("SSH connection failed: {0}")]
    SshFailed(String),

    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    #[error("SSH key not found: {}", .0.display())]
    MissingKey(PathBuf),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no Dockerfile or docker-compose file found in {}", .0.display())]
    NoDescriptor(PathBuf),

    #[error("application port is empty, cannot configure the reverse proxy")]
    EmptyPort,

    #[error("nginx rejected the configuration: {0}")]
    ProxyValidation(String),

    #[error("command timed out after {}s: {command}", .after.as_secs())]
    Timeout { command: String, after: Duration },

    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl DeployError {
    /// Process exit code reported for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingKey(_) => 1,
            Self::SshFailed(_) => 2,
            Self::EmptyPort => 3,
            Self::NoDescriptor(_) => 21,
            _ => 99,
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "killed".to_string(), |c| format!("exit {c}"))
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
