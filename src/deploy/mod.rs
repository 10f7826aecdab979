pub mod compose;
pub mod container;

pub use compose::ComposeStack;
pub use container::SingleContainer;

use std::path::Path;

use tracing::info;

use crate::artifact::Strategy;
use crate::config::DeployConfig;
use crate::error::DeployResult;
use crate::remote::Remote;
use crate::script::{Script, remote_path};

/// A deployer ships the workspace to the remote host and builds
/// and starts containers from it.
pub trait Deployer {
    fn strategy(&self) -> Strategy;

    /// The remote script, with arguments, this deployer runs.
    fn script(&self, config: &DeployConfig) -> DeployResult<Script>;

    /// Upload `workspace` and build and (re)start the application on
    /// `remote`. The script is resolved first, so a configuration
    /// error leaves the remote directory untouched.
    fn deploy(
        &self,
        remote: &dyn Remote,
        config: &DeployConfig,
        workspace: &Path,
    ) -> DeployResult<()> {
        let script = self.script(config)?;
        upload_workspace(remote, workspace, &config.settings.remote_dir)?;

        info!(
            strategy = %self.strategy(),
            script = script.name(),
            "building and starting application"
        );
        remote.run_script(&script, config.settings.build_timeout)
    }
}

#[must_use]
pub fn for_strategy(strategy: Strategy) -> Box<dyn Deployer> {
    match strategy {
        Strategy::Compose => Box::new(ComposeStack::new()),
        Strategy::Dockerfile => Box::new(SingleContainer::new()),
    }
}

/// Replace the remote deployment directory with the contents of
/// `workspace`.
pub fn upload_workspace(
    remote: &dyn Remote,
    workspace: &Path,
    remote_dir: &str,
) -> DeployResult<()> {
    let dir = remote_path(remote_dir);
    info!(
        workspace = %workspace.display(),
        remote_dir,
        "uploading workspace"
    );
    remote.exec(&format!("rm -rf {dir} && mkdir -p {dir}"))?;
    remote.upload_dir(workspace, remote_dir)
}
