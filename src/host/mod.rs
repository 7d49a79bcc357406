//! The other side of the file protocol: whoever launches the engine.
//!
//! - [`submit`]: writes `input_files.json` and `params.json`
//! - [`watch`]: waits for a sentinel and consumes it
//! - [`verify`]: checks which lights produced calibrated frames

pub mod submit;
pub mod verify;
pub mod watch;

pub use submit::{
    CalibrationJob, IntegrationJob, JobWriter, SubmittedJob, calibration_prefix, collect_frames,
};
pub use verify::{CALIBRATED_EXTENSIONS, CalibrationReport, verify_calibration};
pub use watch::SignalWatcher;
