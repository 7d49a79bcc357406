//! Pipeline entry point: one stage run from job documents to `StageResult`.

use tracing::{error, info};

use crate::channel::ControlChannel;
use crate::config::Config;
use crate::engine::Engine;
use crate::errors::PipelineError;
use crate::job::{JobConfig, Stage};
use crate::signal::Signaler;
use crate::stage::{CalibrationDriver, IntegrationDriver, StageArtifact, drive};

/// Terminal outcome of one stage run. Never retried.
#[derive(Debug)]
pub enum StageResult {
    Success {
        stage: Stage,
        artifact: StageArtifact,
    },
    Failure {
        stage: Stage,
        error: PipelineError,
    },
}

impl StageResult {
    pub fn from_outcome(stage: Stage, outcome: Result<StageArtifact, PipelineError>) -> Self {
        match outcome {
            Ok(artifact) => StageResult::Success { stage, artifact },
            Err(error) => StageResult::Failure { stage, error },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success { .. })
    }

    /// Process exit status for this result: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            StageResult::Success { .. } => 0,
            StageResult::Failure { .. } => 1,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageResult::Success { stage, .. } | StageResult::Failure { stage, .. } => *stage,
        }
    }
}

/// Wires configuration, filesystem and engine together for a stage run.
pub struct Pipeline<'a> {
    config: &'a Config,
    channel: &'a dyn ControlChannel,
    signals: &'a dyn ControlChannel,
    engine: &'a dyn Engine,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        channel: &'a dyn ControlChannel,
        engine: &'a dyn Engine,
    ) -> Self {
        Self {
            config,
            channel,
            signals: channel,
            engine,
        }
    }

    /// Write sentinels through `signals` instead of the document channel.
    ///
    /// Dry runs point this at a [`crate::channel::MemoryChannel`] so that no
    /// completion proof appears for work the engine never did.
    pub fn with_signal_channel(mut self, signals: &'a dyn ControlChannel) -> Self {
        self.signals = signals;
        self
    }

    /// Load the job for `stage` and drive it.
    pub async fn execute(&self, stage: Stage) -> Result<StageArtifact, PipelineError> {
        let job = JobConfig::load(
            self.channel,
            stage,
            &self.config.input_files_path,
            &self.config.params_path,
        )?;
        info!(%stage, frames = job.input_files().len(), "job loaded");

        let signaler = Signaler::new(self.signals);
        match stage {
            Stage::Calibration => {
                let driver = CalibrationDriver::new()
                    .with_completion_signal(self.config.calibration_signal_file());
                drive(&driver, &job, self.engine, &signaler).await
            }
            Stage::Integration => {
                let driver = IntegrationDriver::new(self.config.integration_signal_file());
                drive(&driver, &job, self.engine, &signaler).await
            }
        }
    }

    /// Run `stage` and report the outcome to the log.
    pub async fn run(&self, stage: Stage) -> StageResult {
        let result = StageResult::from_outcome(stage, self.execute(stage).await);
        match &result {
            StageResult::Success { artifact, .. } => {
                info!(%stage, artifact = %artifact, "stage succeeded");
            }
            StageResult::Failure { error, .. } => {
                error!(%stage, error = %error, "stage aborted");
            }
        }
        result
    }
}
