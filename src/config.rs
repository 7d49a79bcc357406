use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::signal::SignalFile;
use crate::stack_config::{CONFIG_FILE, DEFAULT_ENGINE_CMD, StackToml};

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub engine_cmd: Option<String>,
}

/// Runtime configuration for pixstack.
///
/// Resolved once from `pixstack.toml`, then `PIXSTACK_*` environment
/// variables, then CLI flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub input_files_path: PathBuf,
    pub params_path: PathBuf,
    pub engine_cmd: String,
    pub engine_args: Vec<String>,
    pub engine_instance: Option<u32>,
    pub launch_signal: String,
    pub integration_signal: String,
    pub calibration_signal: Option<String>,
    pub poll_interval: Duration,
    /// The file the settings came from, if one was found
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration using the process environment.
    ///
    /// An explicit `--config` file must exist; the default `pixstack.toml`
    /// in the current directory is optional.
    pub fn load(overrides: &CliOverrides) -> Result<Self> {
        let (toml, source) = match &overrides.config_file {
            Some(path) => (StackToml::load(path)?, Some(path.clone())),
            None => {
                let path = PathBuf::from(CONFIG_FILE);
                let source = path.exists().then(|| path.clone());
                (StackToml::load_or_default(&path)?, source)
            }
        };

        let mut config = Self::resolve(toml, |key| std::env::var(key).ok(), overrides)?;
        config.source = source;
        Ok(config)
    }

    /// Apply environment lookups and CLI overrides to a parsed file.
    pub fn resolve(
        toml: StackToml,
        env: impl Fn(&str) -> Option<String>,
        overrides: &CliOverrides,
    ) -> Result<Self> {
        let work_dir = overrides
            .work_dir
            .clone()
            .or_else(|| env("PIXSTACK_WORK_DIR").map(PathBuf::from))
            .or(toml.workspace.dir)
            .unwrap_or_else(default_work_dir);

        let engine_cmd = overrides
            .engine_cmd
            .clone()
            .or_else(|| env("PIXSTACK_ENGINE_CMD"))
            .or(toml.engine.cmd)
            .unwrap_or_else(|| DEFAULT_ENGINE_CMD.to_string());

        let instance = match env("PIXSTACK_ENGINE_INSTANCE") {
            Some(raw) => Some(raw.trim().parse::<i64>().with_context(|| {
                format!("PIXSTACK_ENGINE_INSTANCE must be an integer, got '{}'", raw)
            })?),
            None => toml.engine.instance,
        };

        Ok(Self {
            input_files_path: work_dir.join(&toml.workspace.input_files),
            params_path: work_dir.join(&toml.workspace.params),
            work_dir,
            engine_cmd,
            engine_args: toml.engine.args,
            engine_instance: instance.and_then(|i| u32::try_from(i).ok()),
            launch_signal: toml.signals.launch,
            integration_signal: toml.signals.integration,
            calibration_signal: toml.signals.calibration,
            poll_interval: Duration::from_millis(toml.signals.poll_interval_ms),
            source: None,
        })
    }

    pub fn launch_signal_file(&self) -> SignalFile {
        SignalFile::new(&self.work_dir, &self.launch_signal)
    }

    pub fn integration_signal_file(&self) -> SignalFile {
        SignalFile::new(&self.work_dir, &self.integration_signal)
    }

    pub fn calibration_signal_file(&self) -> Option<SignalFile> {
        self.calibration_signal
            .as_ref()
            .map(|name| SignalFile::new(&self.work_dir, name))
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("PixStack")
}
