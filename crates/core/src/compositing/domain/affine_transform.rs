use crate::shared::motion_estimate::CorrectiveTransform;

/// 2x3 affine matrix `[[m00, m01, m02], [m10, m11, m12]]` mapping source
/// pixel coordinates to destination pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    m: [[f64; 3]; 2],
}

impl AffineTransform {
    pub fn new(m: [[f64; 3]; 2]) -> Self {
        Self { m }
    }

    /// Rotation by `da` about the origin followed by translation `(dx, dy)`.
    pub fn from_correction(t: &CorrectiveTransform) -> Self {
        let (sin, cos) = t.da.sin_cos();
        Self::new([[cos, -sin, t.dx], [sin, cos, t.dy]])
    }

    pub fn matrix(&self) -> [[f64; 3]; 2] {
        self.m
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.m;
        (
            m[0][0] * x + m[0][1] * y + m[0][2],
            m[1][0] * x + m[1][1] * y + m[1][2],
        )
    }

    /// Inverse mapping, or `None` for a singular linear part.
    pub fn inverse(&self) -> Option<Self> {
        let [[a, b, tx], [c, d, ty]] = self.m;
        let det = a * d - b * c;
        if det.abs() < 1e-12 || !det.is_finite() {
            return None;
        }
        let (ia, ib, ic, id) = (d / det, -b / det, -c / det, a / det);
        Some(Self::new([
            [ia, ib, -(ia * tx + ib * ty)],
            [ic, id, -(ic * tx + id * ty)],
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_correction() {
        let t = AffineTransform::from_correction(&CorrectiveTransform::IDENTITY);
        assert_eq!(t.matrix(), [[1.0, -0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(t.apply(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_rotation_then_translation() {
        let t = AffineTransform::from_correction(&CorrectiveTransform::new(10.0, 0.0, FRAC_PI_2));
        let (x, y) = t.apply(1.0, 0.0);
        assert_relative_eq!(x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = AffineTransform::from_correction(&CorrectiveTransform::new(-3.5, 7.25, 0.3));
        let inv = t.inverse().unwrap();
        let (x, y) = t.apply(12.0, -4.0);
        let (bx, by) = inv.apply(x, y);
        assert_relative_eq!(bx, 12.0, epsilon = 1e-9);
        assert_relative_eq!(by, -4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let t = AffineTransform::new([[1.0, 2.0, 0.0], [2.0, 4.0, 0.0]]);
        assert!(t.inverse().is_none());
    }
}
