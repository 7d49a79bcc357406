//! Stage execution: `pixstack run <calibrate|integrate>`.

use anyhow::Result;
use console::style;
use std::process::ExitCode;

use pixstack::channel::{DiskChannel, MemoryChannel};
use pixstack::config::Config;
use pixstack::engine::{CommandEngine, RecordingEngine};
use pixstack::job::Stage;
use pixstack::pipeline::{Pipeline, StageResult};

use super::super::Cli;

pub async fn cmd_run(cli: &Cli, stage: Stage, dry_run: bool) -> Result<ExitCode> {
    let config = Config::load(&cli.overrides())?;
    let channel = DiskChannel;

    let result = if dry_run {
        let engine = RecordingEngine::new();
        let scratch = MemoryChannel::new();
        let result = Pipeline::new(&config, &channel, &engine)
            .with_signal_channel(&scratch)
            .run(stage)
            .await;
        println!(
            "{} {} engine call(s) recorded, {} signal(s) withheld",
            style("dry run:").cyan(),
            engine.call_count(),
            scratch.files().len()
        );
        result
    } else {
        let engine = CommandEngine::new(
            config.engine_cmd.clone(),
            config.engine_args.clone(),
            &config.work_dir,
        )
        .with_instance(config.engine_instance);
        Pipeline::new(&config, &channel, &engine).run(stage).await
    };

    report(&result);
    Ok(ExitCode::from(result.exit_code()))
}

fn report(result: &StageResult) {
    match result {
        StageResult::Success { stage, artifact } => {
            println!(
                "{}{} complete: {}",
                super::CHECK,
                style(stage).green().bold(),
                artifact
            );
        }
        StageResult::Failure { stage, error } => {
            eprintln!(
                "{}{} failed: {}",
                super::CROSS,
                style(stage).red().bold(),
                error
            );
            if error.is_configuration_error() {
                eprintln!(
                    "  {}",
                    style("Check input_files.json and params.json in the working directory.").dim()
                );
            }
        }
    }
}
