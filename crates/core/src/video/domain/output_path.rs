use std::path::{Path, PathBuf};

use crate::shared::constants::{DEFAULT_OUTPUT_EXTENSION, OUTPUT_FILE_STEM, VIDEO_EXTENSIONS};

/// Default destination for a stabilized copy of `input`:
/// `stabilized_output.<ext>` in the input's directory.
///
/// The input's extension is kept when it names a known video container,
/// otherwise the output falls back to mp4.
pub fn default_output_path(input: &Path) -> PathBuf {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| VIDEO_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());

    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{OUTPUT_FILE_STEM}.{ext}"))
}

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
