use std::path::PathBuf;

/// Stream properties reported by a `VideoReader` when a source is opened.
///
/// `total_frames` is the container's declared count and may be 0 when the
/// container does not record it.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Metadata for an output stream of the given size, keeping the frame rate.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: self.fps,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        }
    }
}
