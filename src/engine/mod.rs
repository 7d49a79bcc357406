//! The external image-processing engine, seen as a black box.
//!
//! Each operation is one blocking call from the pipeline's point of view: the
//! driver awaits it to completion with no progress callback, cancellation or
//! timeout. Any parallelism happens inside the engine.

mod command;
mod recording;

pub use command::CommandEngine;
pub use recording::{EngineCall, RECORDED_RESULT, RecordingEngine};

use async_trait::async_trait;
use pixstack_common::{CalibrationRequest, IntegrationRequest, ResultHandle, SaveOptions};
use std::path::Path;

use crate::errors::EngineError;

#[async_trait]
pub trait Engine: Send + Sync {
    /// Calibrate every frame in the request into its output directory.
    async fn calibrate(&self, request: &CalibrationRequest) -> Result<(), EngineError>;

    /// Integrate the frames and return the engine's active result, if any.
    ///
    /// `Ok(None)` means the engine ran but produced nothing to save.
    async fn integrate(
        &self,
        request: &IntegrationRequest,
    ) -> Result<Option<ResultHandle>, EngineError>;

    /// Write a result to `path`.
    async fn save(
        &self,
        handle: &ResultHandle,
        path: &Path,
        options: &SaveOptions,
    ) -> Result<(), EngineError>;
}
