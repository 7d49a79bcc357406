//! Sentinel files marking readiness and stage completion.
//!
//! The engine has no return channel to whoever launched it. A sentinel's
//! presence in the shared working directory is the completion proof; its
//! content is always [`SIGNAL_CONTENT`]. This side only ever writes them.
//! Waiting for and consuming them lives in [`crate::host::watch`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::channel::ControlChannel;
use crate::errors::PipelineError;

/// Fixed content of every sentinel file.
pub const SIGNAL_CONTENT: &str = "done";

/// Sentinel written once the engine host is live and can write files.
pub const LAUNCH_SIGNAL: &str = "launch_done.tmp";

/// Sentinel written after a successful integration stage.
pub const INTEGRATION_SIGNAL: &str = "basic_stack_complete.tmp";

/// A marker file in a known directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalFile {
    pub directory: PathBuf,
    pub file_name: String,
}

impl SignalFile {
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Writes sentinel files through a [`ControlChannel`].
pub struct Signaler<'a> {
    channel: &'a dyn ControlChannel,
}

impl<'a> Signaler<'a> {
    pub fn new(channel: &'a dyn ControlChannel) -> Self {
        Self { channel }
    }

    /// Create the signal's directory if needed and (over)write the file.
    pub fn write(&self, signal: &SignalFile) -> Result<PathBuf, PipelineError> {
        let path = signal.path();
        let failed = |source| PipelineError::SignalWriteFailed {
            path: path.clone(),
            source,
        };

        self.channel.ensure_dir(&signal.directory).map_err(failed)?;
        self.channel.write(&path, SIGNAL_CONTENT).map_err(failed)?;

        debug!(path = %path.display(), "signal written");
        Ok(path)
    }

    /// Best-effort readiness signal for the engine host.
    ///
    /// Failures are logged and reported as `false`; they never stop the host
    /// from starting.
    pub fn signal_ready(&self, work_dir: &Path, file_name: &str) -> bool {
        match self.write(&SignalFile::new(work_dir, file_name)) {
            Ok(path) => {
                info!(path = %path.display(), "engine host ready");
                true
            }
            Err(e) => {
                warn!(error = %e, "could not write readiness signal");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{DiskChannel, MemoryChannel};
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_directory_and_content() {
        let channel = MemoryChannel::new();
        let signaler = Signaler::new(&channel);
        let path = signaler
            .write(&SignalFile::new("/tmp/PixStack", INTEGRATION_SIGNAL))
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/PixStack/basic_stack_complete.tmp"));
        assert_eq!(channel.contents(&path).as_deref(), Some("done"));
    }

    #[test]
    fn test_write_is_overwrite_safe() {
        let channel = MemoryChannel::new().with_file("/work/done.tmp", "partial");
        let signaler = Signaler::new(&channel);
        signaler.write(&SignalFile::new("/work", "done.tmp")).unwrap();
        signaler.write(&SignalFile::new("/work", "done.tmp")).unwrap();
        assert_eq!(channel.contents("/work/done.tmp").as_deref(), Some("done"));
    }

    #[test]
    fn test_write_failure_names_path() {
        let channel = MemoryChannel::new().read_only();
        let err = Signaler::new(&channel)
            .write(&SignalFile::new("/work", INTEGRATION_SIGNAL))
            .unwrap_err();
        match err {
            PipelineError::SignalWriteFailed { path, .. } => {
                assert_eq!(path, PathBuf::from("/work/basic_stack_complete.tmp"));
            }
            other => panic!("Expected SignalWriteFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_signal_ready_twice_on_disk() {
        let dir = tempdir().unwrap();
        let work_dir = dir.path().join("PixStack");
        let signaler = Signaler::new(&DiskChannel);

        assert!(signaler.signal_ready(&work_dir, LAUNCH_SIGNAL));
        assert!(signaler.signal_ready(&work_dir, LAUNCH_SIGNAL));
        assert_eq!(
            std::fs::read_to_string(work_dir.join(LAUNCH_SIGNAL)).unwrap(),
            "done"
        );
    }

    #[test]
    fn test_signal_ready_swallows_failure() {
        let channel = MemoryChannel::new().read_only();
        assert!(!Signaler::new(&channel).signal_ready(Path::new("/work"), LAUNCH_SIGNAL));
        assert!(channel.files().is_empty());
    }
}
