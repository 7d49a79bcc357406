use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::ControlChannel;

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    read_only: bool,
}

/// In-memory [`ControlChannel`].
///
/// Directories are tracked explicitly so that writes into a directory nobody
/// created fail the same way they would on disk.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    state: Mutex<State>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        {
            let mut state = self.lock();
            let path = path.as_ref().to_path_buf();
            if let Some(parent) = path.parent() {
                insert_dir_chain(&mut state.dirs, parent);
            }
            state.files.insert(path, contents.into());
        }
        self
    }

    /// Reject every mutation with `PermissionDenied`.
    pub fn read_only(self) -> Self {
        self.lock().read_only = true;
        self
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.lock().files.keys().cloned().collect()
    }

    pub fn has_dir(&self, dir: impl AsRef<Path>) -> bool {
        dir_exists(&self.lock().dirs, dir.as_ref())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn insert_dir_chain(dirs: &mut BTreeSet<PathBuf>, dir: &Path) {
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

fn dir_exists(dirs: &BTreeSet<PathBuf>, dir: &Path) -> bool {
    dir.as_os_str().is_empty() || dir.parent().is_none() || dirs.contains(dir)
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("read-only channel: {}", path.display()),
    )
}

impl ControlChannel for MemoryChannel {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.lock().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if dir_exists(&state.dirs, dir) {
            return Ok(());
        }
        if state.read_only {
            return Err(denied(dir));
        }
        insert_dir_chain(&mut state.dirs, dir);
        Ok(())
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut state = self.lock();
        if state.read_only {
            return Err(denied(path));
        }
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if !dir_exists(&state.dirs, parent) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent directory does not exist: {}", parent.display()),
            ));
        }
        state.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if state.read_only {
            return Err(denied(path));
        }
        state.files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_into_missing_directory_fails() {
        let channel = MemoryChannel::new();
        let err = channel
            .write(Path::new("/work/signal.tmp"), "done")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        channel.ensure_dir(Path::new("/work")).unwrap();
        channel.write(Path::new("/work/signal.tmp"), "done").unwrap();
        assert_eq!(channel.contents("/work/signal.tmp").as_deref(), Some("done"));
    }

    #[test]
    fn test_with_file_creates_parents() {
        let channel = MemoryChannel::new().with_file("/a/b/c.json", "[]");
        assert!(channel.has_dir("/a"));
        assert!(channel.has_dir("/a/b"));
        assert_eq!(channel.read(Path::new("/a/b/c.json")).unwrap(), "[]");
    }

    #[test]
    fn test_read_only_rejects_mutation() {
        let channel = MemoryChannel::new().read_only();
        let err = channel.ensure_dir(Path::new("/work")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(channel.write(Path::new("/x"), "done").is_err());
    }

    #[test]
    fn test_remove_then_exists() {
        let channel = MemoryChannel::new().with_file("/work/done.tmp", "done");
        assert!(channel.exists(Path::new("/work/done.tmp")));
        channel.remove(Path::new("/work/done.tmp")).unwrap();
        assert!(!channel.exists(Path::new("/work/done.tmp")));
        channel.remove(Path::new("/work/done.tmp")).unwrap();
    }
}
