//! Remote shell scripts shipped inside the binary.
//!
//! Scripts live under `scripts/` and are embedded at compile time.
//! They are sent over stdin to `bash -s` and take their parameters
//! as positional arguments, so nothing is spliced into their text.

const BOOTSTRAP: &str = include_str!("../scripts/bootstrap.sh");
const DEPLOY_COMPOSE: &str = include_str!("../scripts/deploy-compose.sh");
const DEPLOY_CONTAINER: &str = include_str!("../scripts/deploy-container.sh");
const CLEANUP: &str = include_str!("../scripts/cleanup.sh");

/// A bundled script plus the arguments for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    name: &'static str,
    body: &'static str,
    args: Vec<String>,
}

impl Script {
    #[must_use]
    pub fn bootstrap() -> Self {
        Self::new("bootstrap", BOOTSTRAP, Vec::new())
    }

    #[must_use]
    pub fn deploy_compose(remote_dir: &str) -> Self {
        Self::new("deploy-compose", DEPLOY_COMPOSE, vec![remote_dir.to_string()])
    }

    #[must_use]
    pub fn deploy_container(remote_dir: &str, container: &str, image: &str, port: u16) -> Self {
        Self::new(
            "deploy-container",
            DEPLOY_CONTAINER,
            vec![
                remote_dir.to_string(),
                container.to_string(),
                image.to_string(),
                port.to_string(),
            ],
        )
    }

    #[must_use]
    pub fn cleanup(remote_dir: &str, container: &str) -> Self {
        Self::new(
            "cleanup",
            CLEANUP,
            vec![remote_dir.to_string(), container.to_string()],
        )
    }

    const fn new(name: &'static str, body: &'static str, args: Vec<String>) -> Self {
        Self { name, body, args }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn body(&self) -> &'static str {
        self.body
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The remote command line: `bash -s -- 'arg1' 'arg2'`.
    #[must_use]
    pub fn command(&self) -> String {
        let mut command = "bash -s --".to_string();
        for arg in &self.args {
            command.push(' ');
            command.push_str(&quote(arg));
        }
        command
    }
}

/// Single-quote `arg` for a POSIX shell.
#[must_use]
pub fn quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// Shell expression for a remote path. A leading `~/` is kept
/// outside the quotes so the remote shell expands it.
#[must_use]
pub fn remote_path(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) if !rest.is_empty() => format!("\"$HOME\"/{}", quote(rest)),
        _ => quote(path),
    }
}
