use async_trait::async_trait;
use pixstack_common::{CalibrationPolicy, CalibrationRequest};
use std::path::PathBuf;
use tracing::debug;

use super::{StageArtifact, StageDriver};
use crate::engine::Engine;
use crate::errors::PipelineError;
use crate::job::{JobConfig, Stage, StageParams};
use crate::signal::{SignalFile, Signaler};

/// Dark/flat calibration of light frames.
///
/// The engine is trusted to write one calibrated frame per input into the
/// output directory; the driver only checks that the call returned.
#[derive(Debug, Clone, Default)]
pub struct CalibrationDriver {
    completion_signal: Option<SignalFile>,
}

impl CalibrationDriver {
    /// A driver that writes no completion sentinel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write `signal` after a successful run.
    pub fn with_completion_signal(mut self, signal: Option<SignalFile>) -> Self {
        self.completion_signal = signal;
        self
    }
}

#[async_trait]
impl StageDriver for CalibrationDriver {
    type Request = CalibrationRequest;

    fn stage(&self) -> Stage {
        Stage::Calibration
    }

    fn build_request(&self, job: &JobConfig) -> Result<CalibrationRequest, PipelineError> {
        let StageParams::Calibration(params) = job.params() else {
            return Err(PipelineError::StageMismatch {
                driver: Stage::Calibration,
                job: job.stage(),
            });
        };

        Ok(CalibrationRequest {
            frames: job.input_files().to_vec(),
            master_dark: params.master_dark.clone(),
            master_flat: params.master_flat.clone(),
            output_dir: params.output_dir.clone(),
            output_postfix: params.prefix.clone(),
            policy: CalibrationPolicy::default(),
        })
    }

    async fn invoke(
        &self,
        engine: &dyn Engine,
        request: &CalibrationRequest,
    ) -> Result<StageArtifact, PipelineError> {
        engine
            .calibrate(request)
            .await
            .map_err(|source| PipelineError::EngineInvocationFailed {
                operation: "calibrate",
                source,
            })?;
        Ok(StageArtifact::Directory(PathBuf::from(&request.output_dir)))
    }

    fn on_success(
        &self,
        _artifact: &StageArtifact,
        signaler: &Signaler<'_>,
    ) -> Result<(), PipelineError> {
        match &self.completion_signal {
            Some(signal) => signaler.write(signal).map(|_| ()),
            None => {
                debug!("calibration writes no completion signal");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryChannel;
    use crate::engine::{EngineCall, RecordingEngine};
    use crate::stage::drive;
    use serde_json::{Value, json};

    fn params() -> Value {
        json!({
            "master_flat": "D:/MASTERS/FLAT/flat_Ha_2024-02-14.fits",
            "master_dark": "D:/MASTERS/DARK/dark_300s_-10C.fits",
            "output_dir": "D:/CALIBRATED/M31",
            "prefix": "__14022024_c"
        })
    }

    fn job(inputs: Value) -> JobConfig {
        JobConfig::from_documents(Stage::Calibration, &inputs, &params()).unwrap()
    }

    #[tokio::test]
    async fn test_passes_parameters_verbatim() {
        let engine = RecordingEngine::new();
        let channel = MemoryChannel::new();
        let signaler = Signaler::new(&channel);
        let job = job(json!(["D:/LIGHT/M31/a.fits", "D:/LIGHT/M31/b.fits"]));

        let artifact = drive(&CalibrationDriver::new(), &job, &engine, &signaler)
            .await
            .unwrap();
        assert_eq!(
            artifact,
            StageArtifact::Directory(PathBuf::from("D:/CALIBRATED/M31"))
        );

        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        let EngineCall::Calibrate(request) = &calls[0] else {
            panic!("Expected a calibrate call, got {:?}", calls[0]);
        };
        assert_eq!(
            request.frames,
            vec![
                PathBuf::from("D:/LIGHT/M31/a.fits"),
                PathBuf::from("D:/LIGHT/M31/b.fits")
            ]
        );
        assert_eq!(request.master_dark, "D:/MASTERS/DARK/dark_300s_-10C.fits");
        assert_eq!(request.master_flat, "D:/MASTERS/FLAT/flat_Ha_2024-02-14.fits");
        assert_eq!(request.output_postfix, "__14022024_c");
        assert!(request.policy.enable_dark && request.policy.enable_flat);
        assert!(!request.policy.enable_bias);
    }

    #[tokio::test]
    async fn test_no_signal_by_default() {
        let engine = RecordingEngine::new();
        let channel = MemoryChannel::new();
        drive(
            &CalibrationDriver::new(),
            &job(json!(["a.fits"])),
            &engine,
            &Signaler::new(&channel),
        )
        .await
        .unwrap();
        assert!(channel.files().is_empty());
    }

    #[tokio::test]
    async fn test_opt_in_completion_signal() {
        let engine = RecordingEngine::new();
        let channel = MemoryChannel::new();
        let driver = CalibrationDriver::new()
            .with_completion_signal(Some(SignalFile::new("/work", "calibration_complete.tmp")));
        drive(&driver, &job(json!(["a.fits"])), &engine, &Signaler::new(&channel))
            .await
            .unwrap();
        assert_eq!(
            channel.contents("/work/calibration_complete.tmp").as_deref(),
            Some("done")
        );
    }

    #[tokio::test]
    async fn test_engine_failure_is_fatal() {
        let engine = RecordingEngine::new().failing_on("calibrate");
        let channel = MemoryChannel::new();
        let driver = CalibrationDriver::new()
            .with_completion_signal(Some(SignalFile::new("/work", "calibration_complete.tmp")));
        let err = drive(&driver, &job(json!(["a.fits"])), &engine, &Signaler::new(&channel))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EngineInvocationFailed {
                operation: "calibrate",
                ..
            }
        ));
        assert_eq!(engine.call_count(), 1);
        assert!(channel.files().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_integration_job() {
        let engine = RecordingEngine::new();
        let channel = MemoryChannel::new();
        let job = JobConfig::from_documents(
            Stage::Integration,
            &json!(["a.fits", "b.fits"]),
            &json!({"output_path": "/out/stack"}),
        )
        .unwrap();
        let err = drive(&CalibrationDriver::new(), &job, &engine, &Signaler::new(&channel))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StageMismatch { .. }));
        assert_eq!(engine.call_count(), 0);
    }
}
