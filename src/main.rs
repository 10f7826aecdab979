use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dropship::{Cli, DeployError, logging, pipeline};
use tracing::error;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(99)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let log = match logging::init_logging(&cli.log_dir)
        .with_context(|| format!("cannot start run log in {}", cli.log_dir.display()))
    {
        Ok(log) => log,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(99);
        }
    };

    let code = match pipeline::run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, exit_code = e.exit_code(), "run failed");
            exit_code(&e)
        }
    };
    tracing::info!(log = %log.path.display(), "log written");
    drop(log);

    ExitCode::from(code)
}

fn exit_code(err: &DeployError) -> u8 {
    u8::try_from(err.exit_code()).unwrap_or(99)
}
