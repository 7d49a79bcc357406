//! Configuration view and validation commands: `pixstack config`.

use anyhow::Result;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

use pixstack::config::Config;
use pixstack::stack_config::{CONFIG_FILE, StackToml};

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<ExitCode> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    match command {
        None | Some(ConfigCommands::Show) => {
            let config = Config::load(&cli.overrides())?;

            println!();
            println!("{}", style("PixStack Configuration").bold());
            println!("======================");
            println!();
            match &config.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!(
                    "No {} found at {}; using defaults.",
                    CONFIG_FILE,
                    config_path.display()
                ),
            }
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  work_dir = \"{}\"", config.work_dir.display());
            println!("  input_files = \"{}\"", config.input_files_path.display());
            println!("  params = \"{}\"", config.params_path.display());
            println!("  engine.cmd = \"{}\"", config.engine_cmd);
            if !config.engine_args.is_empty() {
                println!("  engine.args = {:?}", config.engine_args);
            }
            match config.engine_instance {
                Some(instance) => println!("  engine.instance = {}", instance),
                None => println!("  engine.instance = any"),
            }
            println!("  signals.launch = \"{}\"", config.launch_signal);
            println!("  signals.integration = \"{}\"", config.integration_signal);
            match &config.calibration_signal {
                Some(name) => println!("  signals.calibration = \"{}\"", name),
                None => println!("  signals.calibration = (none)"),
            }
            println!(
                "  signals.poll_interval_ms = {}",
                config.poll_interval.as_millis()
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE);
                return Ok(ExitCode::SUCCESS);
            }

            let warnings = StackToml::load(&config_path)?.validate();
            if warnings.is_empty() {
                println!("{}Configuration is valid.", super::CHECK);
            } else {
                println!("{}", style("Configuration warnings:").yellow());
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!(
                    "{} already exists at {}",
                    CONFIG_FILE,
                    config_path.display()
                );
                println!("Delete it first if you want to recreate it.");
                return Ok(ExitCode::SUCCESS);
            }

            StackToml::default().save(&config_path)?;

            println!("{}Created {}", super::CHECK, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [workspace] dir, input_files, params");
            println!("  - [engine] cmd, args, instance");
            println!("  - [signals] launch, integration, calibration, poll_interval_ms");
            println!();
        }
    }

    Ok(ExitCode::SUCCESS)
}
