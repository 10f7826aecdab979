use tracing::info;

use crate::config::Settings;
use crate::error::DeployResult;
use crate::remote::Remote;
use crate::script::Script;

/// Make sure Docker, a compose tool and Nginx are installed and
/// running. Tools already on the remote `PATH` are left alone.
pub fn run(remote: &dyn Remote, settings: &Settings) -> DeployResult<()> {
    info!(host = %remote.destination(), "bootstrapping remote environment");
    remote.run_script(&Script::bootstrap(), settings.build_timeout)
}
