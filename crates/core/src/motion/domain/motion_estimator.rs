use image::GrayImage;

use crate::shared::motion_estimate::MotionEstimate;

/// Domain interface for frame-to-frame camera motion estimation.
///
/// Implementations never fail: a pair with no observable motion (too few
/// trackable points, a degenerate fit) yields [`MotionEstimate::IDENTITY`].
pub trait MotionEstimator: Send {
    /// Motion mapping `prev` onto `curr`.
    fn estimate(&self, prev: &GrayImage, curr: &GrayImage) -> MotionEstimate;
}
