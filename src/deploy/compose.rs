use crate::artifact::Strategy;
use crate::config::DeployConfig;
use crate::deploy::Deployer;
use crate::error::DeployResult;
use crate::script::Script;

/// `docker compose down` then `up -d --build` in the deployment
/// directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeStack;

impl ComposeStack {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Deployer for ComposeStack {
    fn strategy(&self) -> Strategy {
        Strategy::Compose
    }

    fn script(&self, config: &DeployConfig) -> DeployResult<Script> {
        Ok(Script::deploy_compose(&config.settings.remote_dir))
    }
}
