//! Output artifact path derivation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix every integrated image is saved with.
pub const CANONICAL_SUFFIX: &str = ".fits";

/// Image suffixes recognised on a configured base path (FITS family).
pub const KNOWN_SUFFIXES: &[&str] = &[".fits", ".fit", ".fts"];

/// Derive the save path for an integrated image.
///
/// A known suffix, matched case-insensitively, is stripped once before the
/// canonical suffix is appended. Applying this twice gives the same path as
/// applying it once.
pub fn resolve_output_path(base: &Path) -> PathBuf {
    let Some(text) = base.to_str() else {
        let mut raw: OsString = base.as_os_str().to_owned();
        raw.push(CANONICAL_SUFFIX);
        return PathBuf::from(raw);
    };

    let stem = KNOWN_SUFFIXES
        .iter()
        .find_map(|suffix| strip_suffix_ignore_case(text, suffix))
        .unwrap_or(text);

    PathBuf::from(format!("{stem}{CANONICAL_SUFFIX}"))
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    if !text.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = text.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
