use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::channel::ControlChannel;

/// Extensions the engine may give a calibrated frame, in lookup order.
pub const CALIBRATED_EXTENSIONS: &[&str] = &["fits", "xisf"];

/// Which lights produced a calibrated frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalibrationReport {
    /// (light, calibrated frame) pairs
    pub calibrated: Vec<(PathBuf, PathBuf)>,
    pub missing: Vec<PathBuf>,
}

impl CalibrationReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Look for `output_dir/{stem}{prefix}.fits` (or `.xisf`) for every light.
pub fn verify_calibration(
    channel: &dyn ControlChannel,
    lights: &[PathBuf],
    output_dir: &Path,
    prefix: &str,
) -> CalibrationReport {
    let mut report = CalibrationReport::default();

    for light in lights {
        let Some(stem) = light.file_stem() else {
            report.missing.push(light.clone());
            continue;
        };

        let found = CALIBRATED_EXTENSIONS.iter().find_map(|ext| {
            let mut name = OsString::from(stem);
            name.push(prefix);
            name.push(".");
            name.push(ext);
            let candidate = output_dir.join(name);
            channel.exists(&candidate).then_some(candidate)
        });

        match found {
            Some(calibrated) => {
                debug!(light = %light.display(), calibrated = %calibrated.display(), "calibrated");
                report.calibrated.push((light.clone(), calibrated));
            }
            None => report.missing.push(light.clone()),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryChannel;

    #[test]
    fn test_reports_fits_xisf_and_missing() {
        let channel = MemoryChannel::new()
            .with_file("/out/a__07032024_c.fits", "")
            .with_file("/out/b__07032024_c.xisf", "");
        let lights = vec![
            PathBuf::from("/lights/a.fits"),
            PathBuf::from("/lights/b.fits"),
            PathBuf::from("/lights/c.fits"),
        ];

        let report = verify_calibration(&channel, &lights, Path::new("/out"), "__07032024_c");
        assert_eq!(
            report.calibrated,
            vec![
                (lights[0].clone(), PathBuf::from("/out/a__07032024_c.fits")),
                (lights[1].clone(), PathBuf::from("/out/b__07032024_c.xisf")),
            ]
        );
        assert_eq!(report.missing, vec![lights[2].clone()]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_fits_preferred_over_xisf() {
        let channel = MemoryChannel::new()
            .with_file("/out/a_c.fits", "")
            .with_file("/out/a_c.xisf", "");
        let report =
            verify_calibration(&channel, &[PathBuf::from("/l/a.fit")], Path::new("/out"), "_c");
        assert_eq!(report.calibrated[0].1, PathBuf::from("/out/a_c.fits"));
        assert!(report.is_complete());
    }
}
