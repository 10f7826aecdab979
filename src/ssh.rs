use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cmd::{self, Opts};
use crate::error::DeployResult;
use crate::remote::{Remote, RemoteOutput};
use crate::script;

/// SSH session wrapper for executing commands and transferring
/// files to a remote host.
#[derive(Debug, Clone)]
pub struct SshSession {
    host: String,
    user: String,
    key: Option<PathBuf>,
    connect_timeout: u32,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            key: None,
            connect_timeout: 10,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &Path) -> Self {
        self.key = Some(key_path.to_path_buf());
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, seconds: u32) -> Self {
        self.connect_timeout = seconds;
        self
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.ssh_base_args();
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    /// Options shared by every connection. `BatchMode` makes a
    /// rejected key fail instead of falling back to a password prompt.
    #[must_use]
    pub fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args
    }
}

impl Remote for SshSession {
    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn run(&self, command: &str, input: Option<&[u8]>) -> DeployResult<RemoteOutput> {
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = cmd::capture(
            "ssh",
            &refs,
            &Opts {
                input,
                ..Opts::default()
            },
        )?;

        Ok(RemoteOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn stream(
        &self,
        command: &str,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> DeployResult<()> {
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::stream(
            "ssh",
            &refs,
            &Opts {
                input,
                ..Opts::default()
            },
            timeout,
        )
    }

    /// Streams a tar archive of `local_dir` into `tar -x` on the
    /// remote side.
    fn upload_dir(&self, local_dir: &Path, remote_dir: &str) -> DeployResult<()> {
        let local = local_dir.display().to_string();
        let extract = format!("tar -C {} -xf -", script::remote_path(remote_dir));
        let args = self.build_ssh_args(&extract);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let tar_args = ["-C", local.as_str(), "-cf", "-", "."];
        cmd::pipe(("tar", tar_args.as_slice()), ("ssh", refs.as_slice()))
    }
}
