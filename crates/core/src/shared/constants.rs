/// Fraction of each dimension trimmed from every edge after warping.
pub const CROP_RATIO: f64 = 0.05;

/// File stem of the output written next to the input video.
pub const OUTPUT_FILE_STEM: &str = "stabilized_output";

/// Container used when the input extension is not a known video container.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "m4v", "webm"];

/// Encoder frame rate used when the source reports none.
pub const FALLBACK_FPS: i32 = 30;
