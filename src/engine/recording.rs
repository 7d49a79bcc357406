//! Engine that records calls instead of processing images.
//!
//! Backs `pixstack run --dry-run` and the stage tests.

use async_trait::async_trait;
use pixstack_common::{CalibrationRequest, IntegrationRequest, ResultHandle, SaveOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use super::Engine;
use crate::errors::EngineError;

/// Handle returned by a recording engine's `integrate`.
pub const RECORDED_RESULT: &str = "dry_run_integration";

/// One call received by a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Calibrate(CalibrationRequest),
    Integrate(IntegrationRequest),
    Save {
        handle: ResultHandle,
        path: PathBuf,
        options: SaveOptions,
    },
}

#[derive(Debug)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    active_result: Option<ResultHandle>,
    fail_on: Option<&'static str>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            active_result: Some(ResultHandle::new(RECORDED_RESULT)),
            fail_on: None,
        }
    }
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `integrate` return without an active result.
    pub fn without_active_result(mut self) -> Self {
        self.active_result = None;
        self
    }

    /// Make the named operation (`calibrate`, `integrate`, `save`) fail.
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EngineCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, operation: &'static str, call: EngineCall) -> Result<(), EngineError> {
        self.lock().push(call);
        if self.fail_on == Some(operation) {
            return Err(EngineError::Rejected(format!("{operation} failed (recorded)")));
        }
        Ok(())
    }
}

#[async_trait]
impl Engine for RecordingEngine {
    async fn calibrate(&self, request: &CalibrationRequest) -> Result<(), EngineError> {
        info!(
            frames = request.frames.len(),
            output_dir = %request.output_dir,
            "dry run: calibrate"
        );
        self.record("calibrate", EngineCall::Calibrate(request.clone()))
    }

    async fn integrate(
        &self,
        request: &IntegrationRequest,
    ) -> Result<Option<ResultHandle>, EngineError> {
        info!(frames = request.frames.len(), "dry run: integrate");
        self.record("integrate", EngineCall::Integrate(request.clone()))?;
        Ok(self.active_result.clone())
    }

    async fn save(
        &self,
        handle: &ResultHandle,
        path: &Path,
        options: &SaveOptions,
    ) -> Result<(), EngineError> {
        info!(handle = %handle, path = %path.display(), "dry run: save");
        self.record(
            "save",
            EngineCall::Save {
                handle: handle.clone(),
                path: path.to_path_buf(),
                options: *options,
            },
        )
    }
}
