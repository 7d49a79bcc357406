//! Stage drivers.
//!
//! A driver maps a [`JobConfig`] onto exactly one engine operation and
//! reports what it produced. Both stages share the same sequence:
//!
//! ```text
//! validate -> build_request -> invoke (engine) -> on_success (signals)
//! ```
//!
//! Nothing is retried. The first error ends the run.

mod calibration;
mod integration;

pub use calibration::CalibrationDriver;
pub use integration::{IntegrationDriver, IntegrationPlan};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::engine::Engine;
use crate::errors::PipelineError;
use crate::job::{JobConfig, Stage};
use crate::signal::Signaler;

/// What a successful stage left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageArtifact {
    /// A single image file
    File(PathBuf),
    /// A directory the engine filled with one output per input
    Directory(PathBuf),
}

impl StageArtifact {
    pub fn path(&self) -> &Path {
        match self {
            StageArtifact::File(path) | StageArtifact::Directory(path) => path,
        }
    }
}

impl std::fmt::Display for StageArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageArtifact::File(path) => write!(f, "file {}", path.display()),
            StageArtifact::Directory(path) => write!(f, "directory {}", path.display()),
        }
    }
}

#[async_trait]
pub trait StageDriver: Send + Sync {
    /// Everything `invoke` needs, derived from the job up front.
    type Request: std::fmt::Debug + Send + Sync;

    fn stage(&self) -> Stage;

    /// Reject jobs this driver cannot run.
    ///
    /// Runs before any engine call.
    fn validate(&self, job: &JobConfig) -> Result<(), PipelineError> {
        let stage = self.stage();
        if job.stage() != stage {
            return Err(PipelineError::StageMismatch {
                driver: stage,
                job: job.stage(),
            });
        }
        let actual = job.input_files().len();
        if actual < stage.min_inputs() {
            return Err(PipelineError::InsufficientInputs {
                stage,
                required: stage.min_inputs(),
                actual,
            });
        }
        Ok(())
    }

    fn build_request(&self, job: &JobConfig) -> Result<Self::Request, PipelineError>;

    /// The single blocking engine call for this stage.
    async fn invoke(
        &self,
        engine: &dyn Engine,
        request: &Self::Request,
    ) -> Result<StageArtifact, PipelineError>;

    fn on_success(
        &self,
        artifact: &StageArtifact,
        signaler: &Signaler<'_>,
    ) -> Result<(), PipelineError>;
}

/// Run one stage to completion.
pub async fn drive<D: StageDriver>(
    driver: &D,
    job: &JobConfig,
    engine: &dyn Engine,
    signaler: &Signaler<'_>,
) -> Result<StageArtifact, PipelineError> {
    let stage = driver.stage();
    driver.validate(job)?;
    let request = driver.build_request(job)?;

    info!(%stage, frames = job.input_files().len(), "invoking engine");
    let artifact = driver.invoke(engine, &request).await?;

    driver.on_success(&artifact, signaler)?;
    info!(%stage, artifact = %artifact, "stage complete");
    Ok(artifact)
}
