use async_trait::async_trait;
use pixstack_common::{FrameDescriptor, IntegrationPolicy, IntegrationRequest, SaveOptions};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{StageArtifact, StageDriver};
use crate::engine::Engine;
use crate::errors::PipelineError;
use crate::job::{JobConfig, Stage, StageParams};
use crate::output::resolve_output_path;
use crate::signal::{SignalFile, Signaler};

/// Engine request plus the resolved save destination.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationPlan {
    pub request: IntegrationRequest,
    pub save_path: PathBuf,
}

/// Multi-frame integration into a single stacked image.
#[derive(Debug, Clone)]
pub struct IntegrationDriver {
    completion_signal: SignalFile,
}

impl IntegrationDriver {
    pub fn new(completion_signal: SignalFile) -> Self {
        Self { completion_signal }
    }
}

#[async_trait]
impl StageDriver for IntegrationDriver {
    type Request = IntegrationPlan;

    fn stage(&self) -> Stage {
        Stage::Integration
    }

    fn build_request(&self, job: &JobConfig) -> Result<IntegrationPlan, PipelineError> {
        let StageParams::Integration(params) = job.params() else {
            return Err(PipelineError::StageMismatch {
                driver: Stage::Integration,
                job: job.stage(),
            });
        };

        let frames = job
            .input_files()
            .iter()
            .map(FrameDescriptor::enabled)
            .collect();

        Ok(IntegrationPlan {
            request: IntegrationRequest {
                frames,
                policy: IntegrationPolicy::default(),
            },
            save_path: resolve_output_path(Path::new(&params.output_path)),
        })
    }

    async fn invoke(
        &self,
        engine: &dyn Engine,
        plan: &IntegrationPlan,
    ) -> Result<StageArtifact, PipelineError> {
        let handle = engine
            .integrate(&plan.request)
            .await
            .map_err(|source| PipelineError::EngineInvocationFailed {
                operation: "integrate",
                source,
            })?
            .ok_or(PipelineError::NoActiveResult)?;

        info!(handle = %handle, path = %plan.save_path.display(), "saving integrated image");
        engine
            .save(&handle, &plan.save_path, &SaveOptions::default())
            .await
            .map_err(|source| PipelineError::EngineInvocationFailed {
                operation: "save",
                source,
            })?;

        Ok(StageArtifact::File(plan.save_path.clone()))
    }

    fn on_success(
        &self,
        _artifact: &StageArtifact,
        signaler: &Signaler<'_>,
    ) -> Result<(), PipelineError> {
        signaler.write(&self.completion_signal).map(|_| ())
    }
}
