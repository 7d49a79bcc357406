use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::channel::ControlChannel;
use crate::errors::HostError;
use crate::signal::{SIGNAL_CONTENT, SignalFile};

/// Polls for a sentinel and consumes it once it is complete.
pub struct SignalWatcher<'a> {
    channel: &'a dyn ControlChannel,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl<'a> SignalWatcher<'a> {
    pub fn new(channel: &'a dyn ControlChannel, poll_interval: Duration) -> Self {
        Self {
            channel,
            poll_interval,
            timeout: None,
        }
    }

    /// Give up after `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait until `signal` holds its completion content, remove it and
    /// return how long it took.
    ///
    /// A sentinel that exists but is empty or partial was caught mid-write
    /// and does not count yet. Removing the file leaves the directory clean
    /// for the next run of the same stage.
    pub async fn wait(&self, signal: &SignalFile) -> Result<Duration, HostError> {
        let path = signal.path();
        let started = Instant::now();
        debug!(path = %path.display(), "waiting for signal");

        loop {
            if self.is_complete(&path) {
                self.consume(path)?;
                let waited = started.elapsed();
                info!(signal = %signal.file_name, ?waited, "signal received");
                return Ok(waited);
            }

            let waited = started.elapsed();
            if let Some(limit) = self.timeout
                && waited >= limit
            {
                return Err(HostError::WaitTimedOut { path, waited });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn is_complete(&self, path: &Path) -> bool {
        match self.channel.read(path) {
            Ok(content) if content == SIGNAL_CONTENT => true,
            Ok(content) => {
                debug!(path = %path.display(), bytes = content.len(), "signal not complete yet");
                false
            }
            Err(_) => false,
        }
    }

    fn consume(&self, path: PathBuf) -> Result<(), HostError> {
        self.channel
            .remove(&path)
            .map_err(|source| HostError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{DiskChannel, MemoryChannel};
    use crate::signal::{INTEGRATION_SIGNAL, Signaler};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_existing_signal_is_consumed() {
        let channel = MemoryChannel::new().with_file("/work/basic_stack_complete.tmp", "done");
        let watcher = SignalWatcher::new(&channel, Duration::from_millis(5));

        watcher
            .wait(&SignalFile::new("/work", INTEGRATION_SIGNAL))
            .await
            .unwrap();
        assert!(channel.files().is_empty());
    }

    #[tokio::test]
    async fn test_truncated_signal_is_not_completion() {
        let channel = MemoryChannel::new().with_file("/work/basic_stack_complete.tmp", "");
        let watcher = SignalWatcher::new(&channel, Duration::from_millis(5))
            .with_timeout(Some(Duration::from_millis(30)));

        let err = watcher
            .wait(&SignalFile::new("/work", INTEGRATION_SIGNAL))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::WaitTimedOut { .. }));
        assert_eq!(
            channel.contents("/work/basic_stack_complete.tmp").as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn test_partial_signal_then_complete() {
        let channel = MemoryChannel::new().with_file("/work/basic_stack_complete.tmp", "do");
        let signal = SignalFile::new("/work", INTEGRATION_SIGNAL);
        let watcher = SignalWatcher::new(&channel, Duration::from_millis(5))
            .with_timeout(Some(Duration::from_secs(5)));

        let finish = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Signaler::new(&channel).write(&signal).unwrap();
        };
        let (waited, ()) = tokio::join!(watcher.wait(&signal), finish);
        waited.unwrap();
        assert!(channel.files().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_reports_path() {
        let channel = MemoryChannel::new();
        let watcher = SignalWatcher::new(&channel, Duration::from_millis(5))
            .with_timeout(Some(Duration::from_millis(30)));

        let err = watcher
            .wait(&SignalFile::new("/work", INTEGRATION_SIGNAL))
            .await
            .unwrap_err();
        match err {
            HostError::WaitTimedOut { path, waited } => {
                assert_eq!(path, PathBuf::from("/work/basic_stack_complete.tmp"));
                assert!(waited >= Duration::from_millis(30));
            }
            other => panic!("Expected WaitTimedOut, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signal_written_while_waiting() {
        let dir = tempdir().unwrap();
        let signal = SignalFile::new(dir.path(), INTEGRATION_SIGNAL);

        let writer = {
            let signal = signal.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Signaler::new(&DiskChannel).write(&signal).map(|_| ())
            })
        };

        let watcher = SignalWatcher::new(&DiskChannel, Duration::from_millis(5))
            .with_timeout(Some(Duration::from_secs(5)));
        watcher.wait(&signal).await.unwrap();

        writer.await.unwrap().unwrap();
        assert!(!signal.path().exists());
    }
}
