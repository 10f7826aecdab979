use tracing::info;

use crate::config::CleanupConfig;
use crate::error::DeployResult;
use crate::nginx;
use crate::remote::Remote;
use crate::script::Script;

/// Tear the application down: container or compose stack, unused
/// Docker resources, then the Nginx site. Safe to run against a host
/// where nothing is deployed. Docker and Nginx stay installed.
pub fn run(remote: &dyn Remote, config: &CleanupConfig) -> DeployResult<()> {
    let settings = &config.settings;
    settings.validate()?;
    remote.check_reachable()?;

    info!(host = %remote.destination(), "removing application");
    remote.run_script(
        &Script::cleanup(&settings.remote_dir, &settings.container_name),
        settings.build_timeout,
    )?;
    nginx::remove(remote, &settings.site_name)?;

    info!("cleanup complete");
    Ok(())
}
