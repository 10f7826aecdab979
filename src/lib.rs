//! Ship a Dockerized Git repository to a single Linux host.
//!
//! Dropship takes a repository URL and an SSH login, and leaves the
//! application running in Docker behind an Nginx reverse proxy on
//! port 80. Every step is a plain external tool (`git`, `ssh`, `tar`,
//! `docker`, `nginx`) driven from Rust; there is no agent on the
//! remote host.
//!
//! # Overview
//!
//! A deploy run goes through these phases, stopping at the first
//! failure:
//!
//! 1. **Intake** - seven answers ([`DeployConfig`]), either given as
//!    flags or prompted for on the terminal
//! 2. **Repository sync** - clone or fast-forward a local workspace
//!    ([`repo::sync`])
//! 3. **Artifact verification** - a `docker-compose.yml` or a
//!    `Dockerfile` at the workspace root ([`Artifacts`])
//! 4. **Reachability** - one non-interactive SSH session
//! 5. **Bootstrap** - install Docker, a compose tool and Nginx when
//!    missing ([`bootstrap`])
//! 6. **Transfer and build** - upload the workspace, then either
//!    `docker compose up -d --build` or `docker build` + `docker run`
//!    ([`Deployer`](deploy::Deployer))
//! 7. **Reverse proxy** - write, enable, validate and reload the Nginx
//!    site ([`nginx`])
//! 8. **Probe** - list containers and send a HEAD request to the
//!    application
//!
//! `--cleanup` removes the container or compose stack, prunes Docker
//! and deletes the Nginx site. `--dry-run` stops after step 3 and
//! prints what the remote steps would run.
//!
//! All remote work goes through the [`Remote`] trait, implemented by
//! [`SshSession`].
//!
//! # Examples
//!
//! ## Interactive run
//!
//! ```sh
//! # Prompt for everything
//! dropship
//!
//! # Pre-fill some answers; the token is always prompted for
//! dropship --host 203.0.113.10 --user ubuntu --key ~/.ssh/id_ed25519 --port 8000
//!
//! # Preview without touching the host
//! dropship --dry-run --repo https://github.com/acme/shop.git --port 8000
//!
//! # Tear down
//! dropship --cleanup --host 203.0.113.10 --user ubuntu --key ~/.ssh/id_ed25519
//! ```
//!
//! ## As a library
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use dropship::{DeployConfig, Settings, Target, pipeline};
//! use secrecy::SecretString;
//!
//! fn main() -> anyhow::Result<()> {
//!     let target = Target::new("ubuntu", "203.0.113.10", "~/.ssh/id_ed25519")?;
//!     let config = DeployConfig::new(
//!         "https://github.com/acme/shop.git",
//!         SecretString::from(String::new()),
//!         "main",
//!         target,
//!         Some(8000),
//!     )?
//!     .settings(Settings::new().container_name("shop").site_name("shop"));
//!
//!     let session = config.target.session(&config.settings);
//!     pipeline::deploy(&config, &session, Path::new("."))?;
//!     Ok(())
//! }
//! ```

// Allow noisy pedantic lints that don't add value for a
// deployment tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod artifact;
pub mod bootstrap;
pub mod cleanup;
pub mod cmd;
pub mod config;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod nginx;
pub mod pipeline;
pub mod probe;
pub mod prompt;
pub mod proxy;
pub mod remote;
pub mod repo;
pub mod script;
pub mod ssh;

pub use artifact::{Artifacts, Strategy};
pub use config::{CleanupConfig, DeployConfig, Settings, Target};
pub use deploy::{ComposeStack, Deployer, SingleContainer};
pub use error::{DeployError, DeployResult};
pub use pipeline::Cli;
pub use proxy::ProxySite;
pub use remote::{Remote, RemoteOutput};
pub use script::Script;
pub use ssh::SshSession;
