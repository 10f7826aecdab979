use std::path::Path;
use std::time::Duration;

use crate::error::{DeployError, DeployResult};
use crate::script::{self, Script};

/// What came back from one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    /// `None` when the command was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Turn a non-zero exit into [`DeployError::RemoteFailed`].
    pub fn into_result(self, command: &str) -> DeployResult<String> {
        if self.success() {
            Ok(self.stdout.trim().to_string())
        } else {
            Err(DeployError::RemoteFailed {
                command: command.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs commands on one remote host.
///
/// Every phase talks to the target through this trait, so tests can
/// swap [`SshSession`](crate::ssh::SshSession) for a recording fake.
pub trait Remote {
    /// `user@host`, for log lines.
    fn destination(&self) -> String;

    /// Run `command` in the remote shell and collect its output,
    /// whatever the exit status.
    fn run(&self, command: &str, input: Option<&[u8]>) -> DeployResult<RemoteOutput>;

    /// Run `command`, forwarding its output into the log as it
    /// arrives. Fails on non-zero exit or once `timeout` elapses.
    fn stream(
        &self,
        command: &str,
        input: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> DeployResult<()>;

    /// Copy the contents of `local_dir` into the existing
    /// `remote_dir`.
    fn upload_dir(&self, local_dir: &Path, remote_dir: &str) -> DeployResult<()>;

    /// Run `command` and return its trimmed stdout, failing on a
    /// non-zero exit.
    fn exec(&self, command: &str) -> DeployResult<String> {
        self.run(command, None)?.into_result(command)
    }

    /// Write `content` to a root-owned remote file.
    fn write_file(&self, content: &str, remote_path: &str) -> DeployResult<()> {
        let command = format!("sudo tee {} > /dev/null", script::remote_path(remote_path));
        self.run(&command, Some(content.as_bytes()))?
            .into_result(&command)
            .map(drop)
    }

    /// Run a bundled script through `bash -s` with its arguments.
    fn run_script(&self, script: &Script, timeout: Option<Duration>) -> DeployResult<()> {
        self.stream(&script.command(), Some(script.body().as_bytes()), timeout)
    }

    /// Open one session and run a no-op. A single attempt; any
    /// failure is reported as [`DeployError::SshFailed`].
    fn check_reachable(&self) -> DeployResult<()> {
        match self.run("true", None) {
            Ok(out) if out.success() => Ok(()),
            Ok(out) => Err(DeployError::SshFailed(format!(
                "{}: {}",
                self.destination(),
                if out.stderr.trim().is_empty() {
                    "connection refused or key rejected"
                } else {
                    out.stderr.trim()
                }
            ))),
            Err(e) => Err(DeployError::SshFailed(format!(
                "{}: {e}",
                self.destination()
            ))),
        }
    }
}
