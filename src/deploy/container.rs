use crate::artifact::Strategy;
use crate::config::DeployConfig;
use crate::deploy::Deployer;
use crate::error::DeployResult;
use crate::script::Script;

/// Replace the named container with a fresh build of the
/// `Dockerfile`, publishing the application port as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleContainer;

impl SingleContainer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Deployer for SingleContainer {
    fn strategy(&self) -> Strategy {
        Strategy::Dockerfile
    }

    /// Needs the port to publish, so a blank port fails here with
    /// [`DeployError::EmptyPort`](crate::error::DeployError::EmptyPort).
    fn script(&self, config: &DeployConfig) -> DeployResult<Script> {
        let port = config.require_port()?;
        let settings = &config.settings;
        Ok(Script::deploy_container(
            &settings.remote_dir,
            &settings.container_name,
            &settings.image,
            port,
        ))
    }
}
