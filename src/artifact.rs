use std::fmt;
use std::path::{Path, PathBuf};

use docker_compose_types::{Compose, Ports};
use tracing::{info, warn};

use crate::error::{DeployError, DeployResult};

pub const DOCKERFILE: &str = "Dockerfile";
pub const COMPOSE_FILES: [&str; 2] = ["docker-compose.yml", "docker-compose.yaml"];

/// How the application gets built and started on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `docker compose up -d --build` on the multi-service descriptor.
    Compose,
    /// `docker build` + `docker run` of a single container.
    Dockerfile,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compose => f.write_str("docker compose"),
            Self::Dockerfile => f.write_str("single container"),
        }
    }
}

/// Deployable descriptors found at the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub root: PathBuf,
    pub dockerfile: Option<PathBuf>,
    pub compose: Option<PathBuf>,
}

impl Artifacts {
    /// Look for a `Dockerfile` and a compose file directly under
    /// `root`. Having neither is [`DeployError::NoDescriptor`].
    pub fn inspect(root: &Path) -> DeployResult<Self> {
        let dockerfile = Some(root.join(DOCKERFILE)).filter(|p| p.is_file());
        let compose = COMPOSE_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|p| p.is_file());

        if dockerfile.is_none() && compose.is_none() {
            return Err(DeployError::NoDescriptor(root.to_path_buf()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            dockerfile,
            compose,
        })
    }

    /// Compose wins when both descriptors are present.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        if self.compose.is_some() {
            Strategy::Compose
        } else {
            Strategy::Dockerfile
        }
    }

    /// Log what was found. For compose projects, also warn when no
    /// service publishes `port` on the host. Problems reading the
    /// compose file are warnings: the remote compose tool has the
    /// final word.
    pub fn report(&self, port: Option<u16>) {
        info!(
            dockerfile = self.dockerfile.is_some(),
            compose = ?self.compose.as_ref().and_then(|p| p.file_name()),
            strategy = %self.strategy(),
            "deployable artifacts found"
        );

        let Some(path) = &self.compose else {
            return;
        };
        match ComposeSummary::read(path) {
            Ok(summary) => {
                info!(services = ?summary.services, "compose services");
                if let Some(port) = port.filter(|p| !summary.published_ports.contains(p)) {
                    warn!(
                        port,
                        published = ?summary.published_ports,
                        "no compose service publishes the application port"
                    );
                }
            }
            Err(e) => warn!(error = %e, "could not inspect compose file"),
        }
    }
}

/// The parts of a compose file that matter for the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeSummary {
    pub services: Vec<String>,
    /// Host-side ports from short-syntax `ports:` entries.
    pub published_ports: Vec<u16>,
}

impl ComposeSummary {
    pub fn read(path: &Path) -> DeployResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> DeployResult<Self> {
        let compose: Compose = serde_yaml::from_str(text)?;
        let mut summary = Self::default();

        for (name, service) in &compose.services.0 {
            summary.services.push(name.clone());
            if let Some(Ports::Short(ports)) = service.as_ref().map(|s| &s.ports) {
                summary
                    .published_ports
                    .extend(ports.iter().filter_map(|p| host_port(p)));
            }
        }
        Ok(summary)
    }
}

/// Host port of a short-syntax mapping: `"8000:80"` -> 8000,
/// `"127.0.0.1:8000:80/tcp"` -> 8000. A bare container port is not
/// published on a fixed host port.
#[must_use]
pub fn host_port(mapping: &str) -> Option<u16> {
    let mapping = mapping.split('/').next().unwrap_or(mapping);
    let parts: Vec<&str> = mapping.split(':').collect();
    match parts.as_slice() {
        [host, _container] | [_, host, _container] => host.parse().ok(),
        _ => None,
    }
}
