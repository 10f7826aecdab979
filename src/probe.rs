use serde::Deserialize;
use tracing::{info, warn};

use crate::error::DeployResult;
use crate::remote::Remote;

const PS_COMMAND: &str = "sudo docker ps --format '{{json .}}'";

/// One row of `docker ps --format '{{json .}}'`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Names")]
    pub names: String,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Ports", default)]
    pub ports: String,
}

/// What the post-deploy probe saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub containers: Vec<ContainerSummary>,
    /// Status line of the HEAD request, e.g. `HTTP/1.1 200 OK`.
    pub http_status: Option<String>,
}

/// Parse one JSON object per line, skipping blank lines.
pub fn parse_ps(output: &str) -> DeployResult<Vec<ContainerSummary>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[must_use]
pub fn head_command(port: u16) -> String {
    format!("curl -sI http://127.0.0.1:{port}")
}

/// List running containers and send a HEAD request to the
/// application port. Nothing here fails the run; problems are
/// logged as warnings.
pub fn probe(remote: &dyn Remote, port: Option<u16>) -> ProbeReport {
    let mut report = ProbeReport::default();

    match remote.exec(PS_COMMAND).and_then(|out| parse_ps(&out)) {
        Ok(containers) => {
            for c in &containers {
                info!(
                    id = %c.id,
                    name = %c.names,
                    image = %c.image,
                    status = %c.status,
                    ports = %c.ports,
                    "running container"
                );
            }
            if containers.is_empty() {
                warn!("no running containers");
            }
            report.containers = containers;
        }
        Err(e) => warn!(error = %e, "could not list containers"),
    }

    let Some(port) = port else {
        warn!("no application port, skipping HTTP probe");
        return report;
    };
    match remote.exec(&head_command(port)) {
        Ok(out) => {
            report.http_status = out.lines().next().map(|l| l.trim().to_string());
            match &report.http_status {
                Some(status) => info!(port, %status, "application responded"),
                None => warn!(port, "application sent an empty response"),
            }
        }
        Err(e) => warn!(port, error = %e, "application did not respond"),
    }
    report
}
