//! Typed error hierarchy for pixstack.
//!
//! Three top-level enums cover the three subsystems:
//! - `PipelineError`: configuration, stage and signaling failures
//! - `EngineError`: failures talking to the external engine
//! - `HostError`: job submission and sentinel waiting on the host side

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::job::Stage;

/// Errors from a single pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration file not found: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("Configuration file {} is not valid JSON: {source}", path.display())]
    ConfigMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read configuration file {}: {source}", path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    #[error("Missing required parameter '{key}'")]
    ConfigIncomplete { key: String },

    #[error("{stage} requires at least {required} input file(s), got {actual}")]
    InsufficientInputs {
        stage: Stage,
        required: usize,
        actual: usize,
    },

    #[error("{driver} driver cannot run a {job} job")]
    StageMismatch { driver: Stage, job: Stage },

    #[error("Engine {operation} failed: {source}")]
    EngineInvocationFailed {
        operation: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("Engine returned no active result; nothing to save")]
    NoActiveResult,

    #[error("Failed to write signal file {}: {source}", path.display())]
    SignalWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Whether the error was raised before the engine was ever called.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PipelineError::ConfigMissing { .. }
                | PipelineError::ConfigMalformed { .. }
                | PipelineError::ConfigUnreadable { .. }
                | PipelineError::ConfigInvalid { .. }
                | PipelineError::ConfigIncomplete { .. }
                | PipelineError::InsufficientInputs { .. }
                | PipelineError::StageMismatch { .. }
        )
    }
}

/// Errors from the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn engine command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine exited with code {code}: {stderr}")]
    Exited { code: i32, stderr: String },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Engine rejected the request: {0}")]
    Rejected(String),
}

/// Errors from the host-side tooling.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Timed out after {waited:?} waiting for signal {}", path.display())]
    WaitTimedOut { path: PathBuf, waited: Duration },

    #[error("Filesystem error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid frame pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Failed to serialize job document: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_carries_path() {
        let err = PipelineError::ConfigMissing {
            path: PathBuf::from("/missing/input_files.json"),
        };
        match &err {
            PipelineError::ConfigMissing { path } => {
                assert_eq!(path, &PathBuf::from("/missing/input_files.json"));
            }
            _ => panic!("Expected ConfigMissing"),
        }
        assert!(err.to_string().contains("/missing/input_files.json"));
    }

    #[test]
    fn insufficient_inputs_reports_required_and_actual() {
        let err = PipelineError::InsufficientInputs {
            stage: Stage::Integration,
            required: 2,
            actual: 1,
        };
        let message = err.to_string();
        assert!(message.contains("integration"));
        assert!(message.contains("at least 2"));
        assert!(message.contains("got 1"));
    }

    #[test]
    fn engine_failure_keeps_source() {
        use std::error::Error as _;
        let err = PipelineError::EngineInvocationFailed {
            operation: "integrate",
            source: EngineError::Exited {
                code: 3,
                stderr: "out of memory".to_string(),
            },
        };
        assert!(err.to_string().contains("integrate"));
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("out of memory"));
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(
            PipelineError::ConfigIncomplete {
                key: "master_dark".into()
            }
            .is_configuration_error()
        );
        assert!(!PipelineError::NoActiveResult.is_configuration_error());
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&PipelineError::NoActiveResult);
        assert_std_error(&EngineError::Rejected("x".into()));
        assert_std_error(&HostError::Pattern {
            pattern: "[".into(),
            message: "bad".into(),
        });
    }
}
