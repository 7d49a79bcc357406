//! The filesystem as seen by the pipeline.
//!
//! Stages never touch `std::fs` directly. Everything they read or write goes
//! through a [`ControlChannel`], so the whole protocol can run against
//! [`MemoryChannel`] in tests.

mod disk;
mod memory;

pub use disk::DiskChannel;
pub use memory::MemoryChannel;

use std::io;
use std::path::Path;

/// Narrow file interface used for configuration documents and sentinels.
pub trait ControlChannel: Send + Sync {
    /// Read a whole file as UTF-8 text.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Create a directory and its parents. An existing directory is not an error.
    fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Create or replace a file. The parent directory must already exist.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove a file. A file that is already gone is not an error.
    fn remove(&self, path: &Path) -> io::Result<()>;
}
