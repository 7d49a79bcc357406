//! Engine host bootstrap: `pixstack ready`.

use std::process::ExitCode;
use tracing::warn;

use pixstack::channel::DiskChannel;
use pixstack::config::Config;
use pixstack::signal::Signaler;

use super::super::Cli;

/// Write the launch sentinel. Never fails the process.
pub fn cmd_ready(cli: &Cli) -> ExitCode {
    let config = match Config::load(&cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "configuration unavailable; readiness not signalled");
            return ExitCode::SUCCESS;
        }
    };

    let written = Signaler::new(&DiskChannel).signal_ready(&config.work_dir, &config.launch_signal);
    if written {
        println!(
            "{}Ready: {}",
            super::CHECK,
            config.launch_signal_file().path().display()
        );
    }
    ExitCode::SUCCESS
}
