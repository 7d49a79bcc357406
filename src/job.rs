//! Job model: the validated, immutable configuration of one stage run.
//!
//! A job is assembled from two documents in the working directory:
//!
//! ```text
//! input_files.json   ["D:/LIGHT/M31/a.fits", "D:/LIGHT/M31/b.fits"]
//! params.json        {"output_path": "D:/STACKED/M31_Ha"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::channel::ControlChannel;
use crate::errors::PipelineError;
use crate::loader;

/// A discrete pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Calibration,
    Integration,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Calibration => "calibration",
            Stage::Integration => "integration",
        }
    }

    /// Minimum number of input frames the stage accepts.
    ///
    /// A single frame cannot be integrated.
    pub fn min_inputs(&self) -> usize {
        match self {
            Stage::Calibration => 1,
            Stage::Integration => 2,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calibration parameters, passed to the engine verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationParams {
    pub master_flat: String,
    pub master_dark: String,
    pub output_dir: String,
    pub prefix: String,
}

impl CalibrationParams {
    pub const MASTER_FLAT: &'static str = "master_flat";
    pub const MASTER_DARK: &'static str = "master_dark";
    pub const OUTPUT_DIR: &'static str = "output_dir";
    pub const PREFIX: &'static str = "prefix";
}

/// Integration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationParams {
    /// Base path of the stacked image; the canonical suffix is applied later
    pub output_path: String,
}

impl IntegrationParams {
    pub const OUTPUT_PATH: &'static str = "output_path";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageParams {
    Calibration(CalibrationParams),
    Integration(IntegrationParams),
}

impl StageParams {
    pub fn stage(&self) -> Stage {
        match self {
            StageParams::Calibration(_) => Stage::Calibration,
            StageParams::Integration(_) => Stage::Integration,
        }
    }
}

/// Validated configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    input_files: Vec<PathBuf>,
    params: StageParams,
}

impl JobConfig {
    /// Load both job documents through `channel` and validate them for `stage`.
    pub fn load(
        channel: &dyn ControlChannel,
        stage: Stage,
        input_files_path: &Path,
        params_path: &Path,
    ) -> Result<Self, PipelineError> {
        let inputs = loader::load(channel, input_files_path)?;
        let params = loader::load(channel, params_path)?;
        Self::from_documents(stage, &inputs, &params)
    }

    /// Build a job from already-parsed documents.
    ///
    /// Input count is checked before parameters, so a job that is wrong on
    /// both counts reports `InsufficientInputs`.
    pub fn from_documents(
        stage: Stage,
        inputs: &Value,
        params: &Value,
    ) -> Result<Self, PipelineError> {
        let input_files = parse_input_files(inputs)?;

        let required = stage.min_inputs();
        if input_files.len() < required {
            return Err(PipelineError::InsufficientInputs {
                stage,
                required,
                actual: input_files.len(),
            });
        }

        let map = params.as_object().ok_or_else(|| PipelineError::ConfigInvalid {
            field: "params".to_string(),
            reason: format!("expected a JSON object, found {}", kind_of(params)),
        })?;

        let params = match stage {
            // Keys are checked in field order; the first missing one is reported.
            Stage::Calibration => StageParams::Calibration(CalibrationParams {
                master_flat: required_str(map, CalibrationParams::MASTER_FLAT)?,
                master_dark: required_str(map, CalibrationParams::MASTER_DARK)?,
                output_dir: required_str(map, CalibrationParams::OUTPUT_DIR)?,
                prefix: required_str(map, CalibrationParams::PREFIX)?,
            }),
            Stage::Integration => StageParams::Integration(IntegrationParams {
                output_path: required_str(map, IntegrationParams::OUTPUT_PATH)?,
            }),
        };

        Ok(Self {
            input_files,
            params,
        })
    }

    pub fn stage(&self) -> Stage {
        self.params.stage()
    }

    /// Input frames in the order they were listed.
    pub fn input_files(&self) -> &[PathBuf] {
        &self.input_files
    }

    pub fn params(&self) -> &StageParams {
        &self.params
    }
}

fn parse_input_files(inputs: &Value) -> Result<Vec<PathBuf>, PipelineError> {
    let items = inputs.as_array().ok_or_else(|| PipelineError::ConfigInvalid {
        field: "input_files".to_string(),
        reason: format!("expected a JSON array of paths, found {}", kind_of(inputs)),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(PathBuf::from)
                .ok_or_else(|| PipelineError::ConfigInvalid {
                    field: format!("input_files[{i}]"),
                    reason: format!("expected a path string, found {}", kind_of(item)),
                })
        })
        .collect()
}

fn required_str(map: &Map<String, Value>, key: &str) -> Result<String, PipelineError> {
    match map.get(key) {
        None | Some(Value::Null) => Err(PipelineError::ConfigIncomplete {
            key: key.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(PipelineError::ConfigInvalid {
            field: key.to_string(),
            reason: format!("expected a string, found {}", kind_of(other)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
