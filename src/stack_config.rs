//! `pixstack.toml`: file-level configuration.
//!
//! # Configuration File Format
//!
//! ```toml
//! [workspace]
//! dir = "C:/Temp/PixStack"
//! input_files = "input_files.json"
//! params = "params.json"
//!
//! [engine]
//! cmd = "pixstack-engine"
//! args = ["--automation-mode"]
//! instance = 1
//!
//! [signals]
//! launch = "launch_done.tmp"
//! integration = "basic_stack_complete.tmp"
//! calibration = "calibration_complete.tmp"
//! poll_interval_ms = 1000
//! ```
//!
//! Every section and key is optional. Environment and CLI overrides are
//! applied on top by [`crate::config::Config`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::signal::{INTEGRATION_SIGNAL, LAUNCH_SIGNAL};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "pixstack.toml";

/// Engine command used when neither file, environment nor CLI name one.
pub const DEFAULT_ENGINE_CMD: &str = "pixstack-engine";

/// Where the job documents and sentinels live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSection {
    /// Shared working directory (defaults to `<system temp>/PixStack`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_input_files")]
    pub input_files: String,
    #[serde(default = "default_params")]
    pub params: String,
}

fn default_input_files() -> String {
    "input_files.json".to_string()
}

fn default_params() -> String {
    "params.json".to_string()
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            dir: None,
            input_files: default_input_files(),
            params: default_params(),
        }
    }
}

/// How to reach the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Engine instance slot; negative means "any instance"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<i64>,
}

/// Sentinel file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsSection {
    #[serde(default = "default_launch_signal")]
    pub launch: String,
    #[serde(default = "default_integration_signal")]
    pub integration: String,
    /// Calibration writes no sentinel unless this is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<String>,
    /// Host-side polling interval while waiting for a sentinel
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_launch_signal() -> String {
    LAUNCH_SIGNAL.to_string()
}

fn default_integration_signal() -> String {
    INTEGRATION_SIGNAL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for SignalsSection {
    fn default() -> Self {
        Self {
            launch: default_launch_signal(),
            integration: default_integration_signal(),
            calibration: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// The complete pixstack.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackToml {
    #[serde(default)]
    pub workspace: WorkspaceSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub signals: SignalsSection,
}

impl StackToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse pixstack.toml")
    }

    /// Load `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize pixstack.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (key, name) in [
            ("workspace.input_files", &self.workspace.input_files),
            ("workspace.params", &self.workspace.params),
            ("signals.launch", &self.signals.launch),
            ("signals.integration", &self.signals.integration),
        ] {
            if name.trim().is_empty() {
                warnings.push(format!("'{}' is empty", key));
            } else if name.contains('/') || name.contains('\\') {
                warnings.push(format!(
                    "'{}' should be a file name inside the working directory, got '{}'",
                    key, name
                ));
            }
        }

        if self.workspace.input_files == self.workspace.params {
            warnings.push(
                "workspace.input_files and workspace.params name the same file".to_string(),
            );
        }

        let mut names = vec![&self.signals.launch, &self.signals.integration];
        if let Some(calibration) = &self.signals.calibration {
            if calibration.trim().is_empty() {
                warnings.push("'signals.calibration' is empty".to_string());
            }
            names.push(calibration);
        }
        names.sort();
        if names.windows(2).any(|pair| pair[0] == pair[1]) {
            warnings.push("Two stages share the same signal file name".to_string());
        }

        if self.signals.poll_interval_ms == 0 {
            warnings.push("signals.poll_interval_ms is 0; waiting will busy-poll".to_string());
        }

        if let Some(cmd) = &self.engine.cmd
            && cmd.trim().is_empty()
        {
            warnings.push("'engine.cmd' is empty".to_string());
        }

        warnings
    }
}
