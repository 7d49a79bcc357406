use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

use pixstack::config::CliOverrides;
use pixstack::job::Stage;

mod cmd;

#[derive(Parser)]
#[command(name = "pixstack")]
#[command(version, about = "Astrophotography stacking orchestrator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to pixstack.toml (defaults to ./pixstack.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Shared working directory. Overrides PIXSTACK_WORK_DIR and pixstack.toml.
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,

    /// Engine command. Overrides PIXSTACK_ENGINE_CMD and pixstack.toml.
    #[arg(long, global = true)]
    pub engine_cmd: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_file: self.config.clone(),
            work_dir: self.work_dir.clone(),
            engine_cmd: self.engine_cmd.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the readiness sentinel once the engine host is up
    Ready,
    /// Run one pipeline stage from the job documents in the working directory
    Run {
        stage: StageArg,

        /// Record engine calls instead of invoking the engine
        #[arg(long)]
        dry_run: bool,
    },
    /// Write job documents for a stage
    Submit {
        #[command(subcommand)]
        command: SubmitCommands,
    },
    /// Block until a sentinel appears, then consume it
    Wait {
        /// Sentinel file name inside the working directory
        signal: String,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StageArg {
    Calibrate,
    Integrate,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Calibrate => Stage::Calibration,
            StageArg::Integrate => Stage::Integration,
        }
    }
}

#[derive(Subcommand, Clone)]
pub enum SubmitCommands {
    /// Queue calibration of light frames
    Calibrate {
        #[arg(long)]
        master_flat: PathBuf,

        #[arg(long)]
        master_dark: PathBuf,

        #[arg(long)]
        output_dir: PathBuf,

        /// Observation night (YYYY-MM-DD)
        #[arg(long)]
        date: chrono::NaiveDate,

        /// Wait for the calibration sentinel and verify outputs
        #[arg(long)]
        wait: bool,

        #[arg(long)]
        timeout: Option<u64>,

        /// Light frames or glob patterns
        #[arg(required = true)]
        lights: Vec<String>,
    },
    /// Queue integration of calibrated frames
    Integrate {
        /// Base path of the stacked image
        #[arg(long)]
        output: PathBuf,

        /// Wait for the integration sentinel
        #[arg(long)]
        wait: bool,

        #[arg(long)]
        timeout: Option<u64>,

        /// Frames or glob patterns
        #[arg(required = true)]
        frames: Vec<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default pixstack.toml file
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    pixstack::logging::init(cli.verbose, cli.log_json);

    let outcome = match &cli.command {
        Commands::Ready => Ok(cmd::cmd_ready(&cli)),
        Commands::Run { stage, dry_run } => cmd::cmd_run(&cli, (*stage).into(), *dry_run).await,
        Commands::Submit { command } => cmd::cmd_submit(&cli, command).await,
        Commands::Wait { signal, timeout } => cmd::cmd_wait(&cli, signal, *timeout).await,
        Commands::Config { command } => cmd::cmd_config(&cli, command.clone()),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
