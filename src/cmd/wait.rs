//! Host-side blocking wait: `pixstack wait <SIGNAL>`.

use anyhow::Result;
use std::process::ExitCode;
use std::time::Duration;

use pixstack::channel::DiskChannel;
use pixstack::config::Config;
use pixstack::host::SignalWatcher;
use pixstack::signal::SignalFile;

use super::super::Cli;

pub async fn cmd_wait(cli: &Cli, signal: &str, timeout: Option<u64>) -> Result<ExitCode> {
    let config = Config::load(&cli.overrides())?;
    let signal = SignalFile::new(&config.work_dir, signal);

    let waited = SignalWatcher::new(&DiskChannel, config.poll_interval)
        .with_timeout(timeout.map(Duration::from_secs))
        .wait(&signal)
        .await?;

    println!(
        "{}{} after {:.1}s",
        super::CHECK,
        signal.path().display(),
        waited.as_secs_f64()
    );
    Ok(ExitCode::SUCCESS)
}
