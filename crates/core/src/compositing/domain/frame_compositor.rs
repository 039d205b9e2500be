use crate::shared::frame::Frame;
use crate::shared::motion_estimate::CorrectiveTransform;

/// Domain interface for re-rendering a frame under a corrective transform.
///
/// Returns `None` when no valid output frame can be produced; callers drop
/// that frame and carry on.
pub trait FrameCompositor: Send {
    fn composite(&self, frame: Frame, transform: &CorrectiveTransform) -> Option<Frame>;
}
