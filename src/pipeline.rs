use std::fmt::{self, Write as _};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use crate::artifact::Artifacts;
use crate::bootstrap;
use crate::cleanup;
use crate::cmd;
use crate::config::{DeployConfig, Settings};
use crate::deploy;
use crate::error::{DeployError, DeployResult};
use crate::nginx;
use crate::probe::{self, ProbeReport};
use crate::prompt::{Answers, Prompter};
use crate::proxy::ProxySite;
use crate::remote::Remote;
use crate::repo::{self, Workspace};
use crate::script::{Script, remote_path};

/// Tools the operator's machine must provide.
pub const LOCAL_TOOLS: [&str; 3] = ["git", "ssh", "tar"];

pub const USAGE_NOTE: &str = "Run without arguments to be asked for every value. \
The answer and override flags are optional conveniences; the access token \
is always prompted for.";

#[derive(Debug, Parser)]
#[command(name = "dropship", version)]
#[command(about = "Deploy a Git repository to a Docker host behind Nginx")]
#[command(after_help = USAGE_NOTE)]
pub struct Cli {
    /// Remove a previous deployment instead of deploying
    #[arg(long)]
    pub cleanup: bool,

    /// Sync and inspect the repository, print the plan, touch nothing
    /// remote
    #[arg(long, conflicts_with = "cleanup")]
    pub dry_run: bool,

    #[command(flatten)]
    pub answers: Answers,

    /// Name of the single application container [default: app]
    #[arg(long, help_heading = "Optional overrides")]
    pub container_name: Option<String>,

    /// Image tag for single-container builds [default: myapp:latest]
    #[arg(long, help_heading = "Optional overrides")]
    pub image: Option<String>,

    /// Nginx site file name [default: app]
    #[arg(long, help_heading = "Optional overrides")]
    pub site_name: Option<String>,

    /// Remote deployment directory [default: ~/app]
    #[arg(long, help_heading = "Optional overrides")]
    pub remote_dir: Option<String>,

    /// SSH connection timeout in seconds [default: 10]
    #[arg(long, help_heading = "Optional overrides")]
    pub connect_timeout: Option<u32>,

    /// Bound on bootstrap and build, in seconds; 0 waits forever
    /// [default: 1800]
    #[arg(long, help_heading = "Optional overrides")]
    pub build_timeout: Option<u64>,

    /// Directory for the run log
    #[arg(long, default_value = ".", help_heading = "Optional overrides")]
    pub log_dir: PathBuf,
}

impl Cli {
    /// Defaults overridden by whatever flags were given.
    #[must_use]
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new();
        if let Some(name) = &self.container_name {
            settings = settings.container_name(name);
        }
        if let Some(image) = &self.image {
            settings = settings.image(image);
        }
        if let Some(name) = &self.site_name {
            settings = settings.site_name(name);
        }
        if let Some(dir) = &self.remote_dir {
            settings = settings.remote_dir(dir);
        }
        if let Some(seconds) = self.connect_timeout {
            settings = settings.connect_timeout(seconds);
        }
        if let Some(seconds) = self.build_timeout {
            settings = settings.build_timeout((seconds > 0).then_some(Duration::from_secs(seconds)));
        }
        settings
    }
}

/// Named steps of a deploy run, used to report where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prerequisites,
    Sync,
    Artifacts,
    Reachability,
    Bootstrap,
    Transfer,
    Proxy,
    Probe,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prerequisites => "local prerequisites",
            Self::Sync => "repository sync",
            Self::Artifacts => "artifact verification",
            Self::Reachability => "reachability check",
            Self::Bootstrap => "remote bootstrap",
            Self::Transfer => "transfer and build",
            Self::Proxy => "reverse proxy configuration",
            Self::Probe => "post-deploy probe",
        })
    }
}

fn step<T>(phase: Phase, f: impl FnOnce() -> DeployResult<T>) -> DeployResult<T> {
    info!(%phase, "phase started");
    match f() {
        Ok(value) => {
            info!(%phase, "phase finished");
            Ok(value)
        }
        Err(e) => {
            error!(%phase, "phase failed");
            Err(e)
        }
    }
}

/// Interactive entry point: intake on the terminal, then cleanup,
/// dry run, or a full deploy over SSH. Workspaces are created in the
/// current directory.
pub fn run(cli: &Cli) -> DeployResult<()> {
    let settings = cli.settings();
    settings.validate()?;

    let stdin = std::io::stdin();
    let hide = stdin.is_terminal();
    let mut prompter = Prompter::new(stdin.lock(), std::io::stdout()).hide_secrets(hide);

    if cli.cleanup {
        let config = prompter.cleanup(&cli.answers, settings)?;
        let session = config.target.session(&config.settings);
        return cleanup::run(&session, &config);
    }

    let config = prompter.deploy(&cli.answers, settings)?;
    let base = std::env::current_dir()?;

    if cli.dry_run {
        return dry_run(&config, &base, &mut std::io::stdout().lock());
    }

    let session = config.target.session(&config.settings);
    deploy(&config, &session, &base).map(drop)
}

/// `git`, `ssh` and `tar` must be on `PATH`.
pub fn check_local_tools() -> DeployResult<()> {
    match LOCAL_TOOLS.iter().find(|tool| !cmd::command_exists(tool)) {
        Some(tool) => Err(DeployError::PrerequisiteMissing(format!(
            "`{tool}` not found on PATH"
        ))),
        None => Ok(()),
    }
}

/// The full deploy: sync the repository under `base`, then ship it.
pub fn deploy(config: &DeployConfig, remote: &dyn Remote, base: &Path) -> DeployResult<ProbeReport> {
    config.settings.validate()?;
    step(Phase::Prerequisites, check_local_tools)?;
    let workspace = step(Phase::Sync, || repo::sync(config, base))?;
    deploy_workspace(config, remote, &workspace.path)
}

/// Everything after the repository sync, starting from a checked-out
/// `workspace`. Artifacts are verified before the first remote
/// command.
pub fn deploy_workspace(
    config: &DeployConfig,
    remote: &dyn Remote,
    workspace: &Path,
) -> DeployResult<ProbeReport> {
    let settings = &config.settings;

    let artifacts = step(Phase::Artifacts, || {
        let artifacts = Artifacts::inspect(workspace)?;
        artifacts.report(config.port);
        Ok(artifacts)
    })?;
    step(Phase::Reachability, || remote.check_reachable())?;
    step(Phase::Bootstrap, || bootstrap::run(remote, settings))?;

    let deployer = deploy::for_strategy(artifacts.strategy());
    step(Phase::Transfer, || deployer.deploy(remote, config, workspace))?;
    step(Phase::Proxy, || nginx::configure(remote, config))?;
    let report = step(Phase::Probe, || Ok(probe::probe(remote, config.port)))?;

    info!(
        host = %remote.destination(),
        strategy = %artifacts.strategy(),
        "deployment complete"
    );
    Ok(report)
}

/// Sync and inspect locally, then write the plan to `out`. No remote
/// command is issued.
pub fn dry_run(config: &DeployConfig, base: &Path, out: &mut impl Write) -> DeployResult<()> {
    config.settings.validate()?;
    step(Phase::Prerequisites, check_local_tools)?;
    let workspace = step(Phase::Sync, || repo::sync(config, base))?;
    let artifacts = step(Phase::Artifacts, || {
        let artifacts = Artifacts::inspect(&workspace.path)?;
        artifacts.report(config.port);
        Ok(artifacts)
    })?;

    out.write_all(render_plan(config, &workspace, &artifacts)?.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// What a deploy of `workspace` would do on the remote host.
pub fn render_plan(
    config: &DeployConfig,
    workspace: &Workspace,
    artifacts: &Artifacts,
) -> DeployResult<String> {
    let settings = &config.settings;
    let deployer = deploy::for_strategy(artifacts.strategy());
    let build = deployer.script(config)?;
    let site = ProxySite::new(&settings.site_name, config.require_port()?);
    let dir = remote_path(&settings.remote_dir);

    let mut plan = String::new();
    let _ = writeln!(plan, "=== Dry run: no remote changes will be made ===");
    let _ = writeln!(
        plan,
        "target:    {}@{}",
        config.target.user, config.target.host
    );
    let _ = writeln!(plan, "workspace: {}", workspace.path.display());
    let _ = writeln!(plan, "commit:    {}", workspace.commit);
    let _ = writeln!(plan, "strategy:  {}", artifacts.strategy());
    let _ = writeln!(plan);

    write_script(&mut plan, &Script::bootstrap());
    let _ = writeln!(plan, "--- upload ---");
    let _ = writeln!(plan, "$ rm -rf {dir} && mkdir -p {dir}");
    let _ = writeln!(
        plan,
        "$ tar -C {} -cf - . | ssh ... 'tar -C {dir} -xf -'",
        workspace.path.display()
    );
    let _ = writeln!(plan);
    write_script(&mut plan, &build);

    let _ = writeln!(plan, "--- {} ---", nginx::available_path(&site.name));
    let _ = writeln!(plan, "{}", nginx::render(&site));
    Ok(plan)
}

fn write_script(plan: &mut String, script: &Script) {
    let _ = writeln!(plan, "--- {} ---", script.name());
    let _ = writeln!(plan, "$ {}", script.command());
    let _ = writeln!(plan, "{}", script.body().trim_end());
    let _ = writeln!(plan);
}
