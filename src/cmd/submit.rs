//! Job submission from the host side: `pixstack submit <calibrate|integrate>`.

use anyhow::{Context, Result};
use console::style;
use std::process::ExitCode;
use std::time::Duration;

use pixstack::channel::DiskChannel;
use pixstack::config::Config;
use pixstack::host::{
    CalibrationJob, IntegrationJob, JobWriter, SignalWatcher, SubmittedJob, calibration_prefix,
    collect_frames, verify_calibration,
};
use pixstack::signal::SignalFile;

use super::super::{Cli, SubmitCommands};

pub async fn cmd_submit(cli: &Cli, command: &SubmitCommands) -> Result<ExitCode> {
    let config = Config::load(&cli.overrides())?;
    let writer = JobWriter::new(&DiskChannel, &config.input_files_path, &config.params_path);

    match command {
        SubmitCommands::Calibrate {
            master_flat,
            master_dark,
            output_dir,
            date,
            wait,
            timeout,
            lights,
        } => {
            let job = CalibrationJob {
                lights: collect_frames(lights).context("Failed to expand light frames")?,
                master_flat: master_flat.clone(),
                master_dark: master_dark.clone(),
                output_dir: output_dir.clone(),
                date_obs: *date,
            };
            let submitted = writer
                .submit_calibration(&job)
                .context("Failed to write calibration job")?;
            print_submitted(&submitted);

            if !*wait {
                return Ok(ExitCode::SUCCESS);
            }
            let Some(signal) = config.calibration_signal_file() else {
                anyhow::bail!(
                    "--wait needs a calibration sentinel; set [signals] calibration in pixstack.toml"
                );
            };
            wait_for(&config, &signal, *timeout).await?;

            let report = verify_calibration(
                &DiskChannel,
                &job.lights,
                &job.output_dir,
                &calibration_prefix(job.date_obs),
            );
            println!(
                "  {} calibrated, {} missing",
                style(report.calibrated.len()).green(),
                style(report.missing.len()).yellow()
            );
            for light in &report.missing {
                println!("    {} {}", style("missing:").yellow(), light.display());
            }
            Ok(if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        SubmitCommands::Integrate {
            output,
            wait,
            timeout,
            frames,
        } => {
            let job = IntegrationJob {
                frames: collect_frames(frames).context("Failed to expand frames")?,
                output_path: output.clone(),
            };
            let submitted = writer
                .submit_integration(&job)
                .context("Failed to write integration job")?;
            print_submitted(&submitted);

            if *wait {
                wait_for(&config, &config.integration_signal_file(), *timeout).await?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_submitted(submitted: &SubmittedJob) {
    println!(
        "{}Submitted {} job with {} frame(s)",
        super::CHECK,
        style(submitted.stage).bold(),
        submitted.frames
    );
    for path in [&submitted.input_files, &submitted.params] {
        println!("  {}", style(path.display()).dim());
    }
}

async fn wait_for(
    config: &Config,
    signal: &SignalFile,
    timeout: Option<u64>,
) -> Result<()> {
    println!(
        "{}Waiting for {}",
        super::CLOCK,
        style(&signal.file_name).cyan()
    );
    let waited = SignalWatcher::new(&DiskChannel, config.poll_interval)
        .with_timeout(timeout.map(Duration::from_secs))
        .wait(signal)
        .await?;
    println!("{}Done after {}s", super::CHECK, waited.as_secs());
    Ok(())
}
