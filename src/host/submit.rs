use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::channel::ControlChannel;
use crate::errors::HostError;
use crate::job::{CalibrationParams, IntegrationParams, Stage};

/// Everything needed to queue a calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationJob {
    pub lights: Vec<PathBuf>,
    pub master_flat: PathBuf,
    pub master_dark: PathBuf,
    pub output_dir: PathBuf,
    /// Observation night; becomes part of every calibrated file name
    pub date_obs: NaiveDate,
}

/// Everything needed to queue an integration run.
#[derive(Debug, Clone)]
pub struct IntegrationJob {
    pub frames: Vec<PathBuf>,
    /// Base path of the stacked image, with or without suffix
    pub output_path: PathBuf,
}

/// Where a submission landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub stage: Stage,
    pub input_files: PathBuf,
    pub params: PathBuf,
    pub frames: usize,
}

/// File-name marker for a night's calibrated frames: `__DDMMYYYY_c`.
pub fn calibration_prefix(date_obs: NaiveDate) -> String {
    format!("__{}_c", date_obs.format("%d%m%Y"))
}

/// Expand frame arguments into a de-duplicated list of paths.
///
/// Arguments containing glob metacharacters are expanded and their matches
/// sorted; a pattern matching nothing yields nothing. Plain paths are kept
/// as given, in order, whether or not they exist.
pub fn collect_frames<S: AsRef<str>>(args: &[S]) -> Result<Vec<PathBuf>, HostError> {
    let mut seen = HashSet::new();
    let mut frames = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        let candidates = if is_pattern(arg) {
            let entries = glob::glob(arg).map_err(|e| HostError::Pattern {
                pattern: arg.to_string(),
                message: e.msg.to_string(),
            })?;
            let mut matches: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
            matches.sort();
            if matches.is_empty() {
                warn!(pattern = arg, "frame pattern matched nothing");
            }
            matches
        } else {
            vec![PathBuf::from(arg)]
        };

        for path in candidates {
            if seen.insert(path.clone()) {
                frames.push(path);
            }
        }
    }

    Ok(frames)
}

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

/// Writes job documents into the shared working directory.
pub struct JobWriter<'a> {
    channel: &'a dyn ControlChannel,
    input_files_path: PathBuf,
    params_path: PathBuf,
}

impl<'a> JobWriter<'a> {
    pub fn new(
        channel: &'a dyn ControlChannel,
        input_files_path: impl Into<PathBuf>,
        params_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            channel,
            input_files_path: input_files_path.into(),
            params_path: params_path.into(),
        }
    }

    /// Queue a calibration run. Creates the output directory.
    pub fn submit_calibration(&self, job: &CalibrationJob) -> Result<SubmittedJob, HostError> {
        let output_dir = absolute(&job.output_dir)?;
        self.ensure_dir(&output_dir)?;

        let params = CalibrationParams {
            master_flat: display(&absolute(&job.master_flat)?),
            master_dark: display(&absolute(&job.master_dark)?),
            output_dir: display(&output_dir),
            prefix: calibration_prefix(job.date_obs),
        };
        self.write_documents(Stage::Calibration, &job.lights, &params)
    }

    /// Queue an integration run. Creates the output's parent directory.
    pub fn submit_integration(&self, job: &IntegrationJob) -> Result<SubmittedJob, HostError> {
        let output_path = absolute(&job.output_path)?;
        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.ensure_dir(parent)?;
        }

        let params = IntegrationParams {
            output_path: display(&output_path),
        };
        self.write_documents(Stage::Integration, &job.frames, &params)
    }

    fn write_documents(
        &self,
        stage: Stage,
        frames: &[PathBuf],
        params: &impl Serialize,
    ) -> Result<SubmittedJob, HostError> {
        if frames.len() < stage.min_inputs() {
            warn!(
                %stage,
                frames = frames.len(),
                required = stage.min_inputs(),
                "submitting fewer frames than the stage accepts"
            );
        }

        let inputs = frames
            .iter()
            .map(|frame| absolute(frame).map(|p| display(&p)))
            .collect::<Result<Vec<_>, _>>()?;

        self.write_json(&self.input_files_path, &inputs)?;
        self.write_json(&self.params_path, params)?;

        info!(
            %stage,
            frames = inputs.len(),
            input_files = %self.input_files_path.display(),
            "job submitted"
        );
        Ok(SubmittedJob {
            stage,
            input_files: self.input_files_path.clone(),
            params: self.params_path.clone(),
            frames: inputs.len(),
        })
    }

    fn write_json(&self, path: &Path, value: &impl Serialize) -> Result<(), HostError> {
        let body = serde_json::to_string_pretty(value)?;
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }
        self.channel.write(path, &body).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "job document written");
        Ok(())
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), HostError> {
        self.channel.ensure_dir(dir).map_err(|source| HostError::Io {
            path: dir.to_path_buf(),
            source,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, HostError> {
    std::path::absolute(path).map_err(|source| HostError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
