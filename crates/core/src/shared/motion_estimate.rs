use std::ops::{Add, Sub};

/// Rigid 2D motion between two consecutive frames: translation in pixels
/// and rotation in radians.
///
/// The same triple is reused for cumulative trajectory positions and for
/// corrective transforms, which keeps the arithmetic between them plain
/// component-wise addition.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionEstimate {
    pub dx: f64,
    pub dy: f64,
    pub da: f64,
}

/// Per-frame transform applied when re-rendering a frame.
pub type CorrectiveTransform = MotionEstimate;

impl MotionEstimate {
    pub const IDENTITY: MotionEstimate = MotionEstimate {
        dx: 0.0,
        dy: 0.0,
        da: 0.0,
    };

    pub fn new(dx: f64, dy: f64, da: f64) -> Self {
        Self { dx, dy, da }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Components in `[dx, dy, da]` order, for per-axis processing.
    pub fn components(&self) -> [f64; 3] {
        [self.dx, self.dy, self.da]
    }

    pub fn from_components(c: [f64; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }

    /// Length of the translation part.
    pub fn translation_norm(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

impl Add for MotionEstimate {
    type Output = MotionEstimate;

    fn add(self, rhs: MotionEstimate) -> MotionEstimate {
        MotionEstimate::new(self.dx + rhs.dx, self.dy + rhs.dy, self.da + rhs.da)
    }
}

impl Sub for MotionEstimate {
    type Output = MotionEstimate;

    fn sub(self, rhs: MotionEstimate) -> MotionEstimate {
        MotionEstimate::new(self.dx - rhs.dx, self.dy - rhs.dy, self.da - rhs.da)
    }
}
