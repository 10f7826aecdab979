//! Interactive parameter intake.
//!
//! Values given on the command line are taken as-is; everything else
//! is asked for in a fixed order. All answers are collected before any
//! of them is validated.

use std::io::{BufRead, Write};

use clap::Args;
use inquire::{Password, PasswordDisplayMode};
use secrecy::SecretString;
use tracing::info;

use crate::config::{self, CleanupConfig, DeployConfig, Settings, Target};
use crate::error::DeployResult;

/// Answers supplied up front. There is no token field; the token is
/// only ever typed in.
#[derive(Debug, Clone, Default, Args)]
#[command(next_help_heading = "Optional answers")]
pub struct Answers {
    /// Git repository URL (https)
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch to deploy [default: main]
    #[arg(long)]
    pub branch: Option<String>,

    /// Remote SSH username
    #[arg(long)]
    pub user: Option<String>,

    /// Remote host name or IP address
    #[arg(long)]
    pub host: Option<String>,

    /// Path to the SSH private key
    #[arg(long)]
    pub key: Option<String>,

    /// Internal application port
    #[arg(long)]
    pub port: Option<String>,
}

/// Reads answers from `input`, writing questions to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    hide_secrets: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hide_secrets: false,
        }
    }

    /// Read secrets on the terminal without echo instead of from
    /// `input`. Only meaningful when stdin is a TTY.
    #[must_use]
    pub const fn hide_secrets(mut self, hide: bool) -> Self {
        self.hide_secrets = hide;
        self
    }

    /// Ask one question. End of input counts as a blank answer.
    pub fn ask(&mut self, question: &str) -> DeployResult<String> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Ask for a secret. With [`hide_secrets`](Self::hide_secrets)
    /// the answer is typed without echo; otherwise it is read like
    /// any other answer.
    pub fn ask_secret(&mut self, question: &str) -> DeployResult<SecretString> {
        let answer = if self.hide_secrets {
            Password::new(question)
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Hidden)
                .prompt()?
        } else {
            self.ask(question)?
        };
        Ok(SecretString::from(answer.trim().to_string()))
    }

    fn answer(&mut self, preset: Option<&String>, question: &str) -> DeployResult<String> {
        match preset {
            Some(value) => Ok(value.clone()),
            None => self.ask(question),
        }
    }

    /// Collect the seven deploy parameters.
    pub fn deploy(&mut self, answers: &Answers, settings: Settings) -> DeployResult<DeployConfig> {
        let repo = self.answer(answers.repo.as_ref(), "Git repository URL")?;
        let token = self.ask_secret("Personal access token (blank for public repos)")?;
        let branch = self.answer(answers.branch.as_ref(), "Branch name [main]")?;
        let user = self.answer(answers.user.as_ref(), "Remote username")?;
        let host = self.answer(answers.host.as_ref(), "Remote host/IP")?;
        let key = self.answer(answers.key.as_ref(), "SSH private key path")?;
        let port = self.answer(answers.port.as_ref(), "Application port (e.g. 8000)")?;

        let target = Target::new(&user, &host, &key)?;
        let port = config::parse_port(&port)?;
        let deploy = DeployConfig::new(&repo, token, &branch, target, port)?.settings(settings);

        info!(
            repo = %deploy.repo_url,
            branch = %deploy.branch,
            user = %deploy.target.user,
            host = %deploy.target.host,
            key = %deploy.target.key.display(),
            port = ?deploy.port,
            "parameters collected"
        );
        Ok(deploy)
    }

    /// Collect the three teardown parameters.
    pub fn cleanup(&mut self, answers: &Answers, settings: Settings) -> DeployResult<CleanupConfig> {
        let user = self.answer(answers.user.as_ref(), "Remote username")?;
        let host = self.answer(answers.host.as_ref(), "Remote host/IP")?;
        let key = self.answer(answers.key.as_ref(), "SSH private key path")?;

        let target = Target::new(&user, &host, &key)?;
        info!(
            user = %target.user,
            host = %target.host,
            key = %target.key.display(),
            "cleanup parameters collected"
        );
        Ok(CleanupConfig::new(target).settings(settings))
    }
}
