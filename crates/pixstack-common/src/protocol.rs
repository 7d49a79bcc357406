//! Request and reply documents exchanged with the engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::policy::{CalibrationPolicy, IntegrationPolicy, SaveOptions};

/// One frame handed to the integration stage.
///
/// `drizzle_path` and `local_normalization_path` are reserved by the engine
/// and always sent empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub enabled: bool,
    pub path: PathBuf,
    #[serde(default)]
    pub drizzle_path: String,
    #[serde(default)]
    pub local_normalization_path: String,
}

impl FrameDescriptor {
    /// An enabled frame with no drizzle or local normalization data.
    pub fn enabled(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
            drizzle_path: String::new(),
            local_normalization_path: String::new(),
        }
    }
}

/// Opaque handle to the engine's most recently produced in-memory result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultHandle(String);

impl ResultHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRequest {
    /// Light frames, in job order
    pub frames: Vec<PathBuf>,
    pub master_dark: String,
    pub master_flat: String,
    pub output_dir: String,
    /// Postfix the engine appends to each calibrated file name
    pub output_postfix: String,
    pub policy: CalibrationPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRequest {
    pub frames: Vec<FrameDescriptor>,
    pub policy: IntegrationPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub handle: ResultHandle,
    pub path: PathBuf,
    pub options: SaveOptions,
}

impl SaveRequest {
    pub fn new(handle: ResultHandle, path: &Path, options: SaveOptions) -> Self {
        Self {
            handle,
            path: path.to_path_buf(),
            options,
        }
    }
}

/// A single engine operation, tagged by name on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum EngineRequest {
    Calibrate(CalibrationRequest),
    Integrate(IntegrationRequest),
    Save(SaveRequest),
}

impl EngineRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            EngineRequest::Calibrate(_) => "calibrate",
            EngineRequest::Integrate(_) => "integrate",
            EngineRequest::Save(_) => "save",
        }
    }
}

/// What the engine prints on stdout when an operation returns.
///
/// An empty stdout is read as `EngineReply::default()`, which is a success
/// with no active result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineReply {
    #[serde(default = "default_ok")]
    pub ok: bool,
    #[serde(default)]
    pub active_result: Option<ResultHandle>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_ok() -> bool {
    true
}

impl Default for EngineReply {
    fn default() -> Self {
        Self {
            ok: true,
            active_result: None,
            message: None,
        }
    }
}
