use std::path::PathBuf;

use crate::shared::motion_estimate::MotionEstimate;

/// Outcome of a successful stabilization run.
#[derive(Clone, Debug)]
pub struct StabilizationReport {
    pub output_path: PathBuf,
    /// Frames decoded during motion estimation.
    pub frames_read: usize,
    pub frames_written: usize,
    /// Frames whose composite came back empty.
    pub frames_dropped: usize,
    pub trajectory: Vec<MotionEstimate>,
    pub smoothed: Vec<MotionEstimate>,
}
