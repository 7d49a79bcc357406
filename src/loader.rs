//! JSON document loading for stage configuration.

use std::io;
use std::path::Path;

use serde_json::Value;

use crate::channel::ControlChannel;
use crate::errors::PipelineError;

/// Load and parse one JSON document.
///
/// Either the whole document parses or an error naming the path is returned.
pub fn load(channel: &dyn ControlChannel, path: &Path) -> Result<Value, PipelineError> {
    let content = channel.read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PipelineError::ConfigMissing {
            path: path.to_path_buf(),
        },
        _ => PipelineError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    serde_json::from_str(&content).map_err(|source| PipelineError::ConfigMalformed {
        path: path.to_path_buf(),
        source,
    })
}
