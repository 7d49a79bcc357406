//! Engine reached through a subprocess per operation.
//!
//! - The request is written to the child's stdin as one JSON document
//! - The reply is read from stdout as one JSON document (empty means `{}`)
//! - Exit code 0 is required; anything else is an engine failure

use async_trait::async_trait;
use pixstack_common::{
    CalibrationRequest, EngineReply, EngineRequest, IntegrationRequest, ResultHandle,
    SaveOptions, SaveRequest,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::Engine;
use crate::errors::EngineError;

/// Runs the configured engine command once per operation.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
    instance: Option<u32>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, work_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args,
            work_dir: work_dir.as_ref().to_path_buf(),
            instance: None,
        }
    }

    /// Target a specific running engine instance.
    pub fn with_instance(mut self, instance: Option<u32>) -> Self {
        self.instance = instance;
        self
    }

    async fn execute(&self, request: &EngineRequest) -> Result<EngineReply, EngineError> {
        let operation = request.operation();
        let payload = serde_json::to_vec(request)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("PIXSTACK_OPERATION", operation)
            .env("PIXSTACK_WORK_DIR", &self.work_dir);
        if let Some(instance) = self.instance {
            cmd.env("PIXSTACK_ENGINE_INSTANCE", instance.to_string());
        }

        debug!(program = %self.program, operation, bytes = payload.len(), "spawning engine");
        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Feed stdin while draining stdout/stderr; an engine may answer
        // before it has read the whole request.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(EngineError::Exited {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }
        match fed {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!(operation, "engine exited without reading the whole request");
            }
            other => other?,
        }
        if !stderr.is_empty() {
            debug!(operation, stderr = %stderr, "engine stderr");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply = if stdout.trim().is_empty() {
            EngineReply::default()
        } else {
            serde_json::from_str::<EngineReply>(stdout.trim())?
        };

        if !reply.ok {
            return Err(EngineError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| format!("{operation} reported failure")),
            ));
        }
        info!(operation, "engine operation returned");
        Ok(reply)
    }
}

#[async_trait]
impl Engine for CommandEngine {
    async fn calibrate(&self, request: &CalibrationRequest) -> Result<(), EngineError> {
        self.execute(&EngineRequest::Calibrate(request.clone()))
            .await
            .map(|_| ())
    }

    async fn integrate(
        &self,
        request: &IntegrationRequest,
    ) -> Result<Option<ResultHandle>, EngineError> {
        let reply = self
            .execute(&EngineRequest::Integrate(request.clone()))
            .await?;
        Ok(reply.active_result)
    }

    async fn save(
        &self,
        handle: &ResultHandle,
        path: &Path,
        options: &SaveOptions,
    ) -> Result<(), EngineError> {
        let request = SaveRequest::new(handle.clone(), path, *options);
        self.execute(&EngineRequest::Save(request)).await.map(|_| ())
    }
}
