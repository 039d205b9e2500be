use crate::shared::motion_estimate::{CorrectiveTransform, MotionEstimate};

/// Per-frame corrective transforms: each raw estimate shifted by how far the
/// smoothed path sits from the measured path at that frame.
///
/// All three slices must have the same length; the result is truncated to
/// the shortest one otherwise.
pub fn compose(
    estimates: &[MotionEstimate],
    trajectory: &[MotionEstimate],
    smoothed: &[MotionEstimate],
) -> Vec<CorrectiveTransform> {
    debug_assert_eq!(estimates.len(), trajectory.len());
    debug_assert_eq!(estimates.len(), smoothed.len());

    estimates
        .iter()
        .zip(trajectory)
        .zip(smoothed)
        .map(|((e, t), s)| *e + (*s - *t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::domain::{trajectory, trajectory_smoother};
    use approx::assert_relative_eq;

    fn jittery(n: usize) -> Vec<MotionEstimate> {
        (0..n)
            .map(|i| {
                let f = i as f64;
                MotionEstimate::new(2.0 + (f * 1.3).sin(), (f * 0.9).cos() - 0.5, 0.01 * (f * 2.1).sin())
            })
            .collect()
    }

    #[test]
    fn test_zero_deviation_returns_estimates() {
        let e = jittery(6);
        let t = trajectory::build(&e);
        assert_eq!(compose(&e, &t, &t), e);
    }

    #[test]
    fn test_correction_formula() {
        let e = [MotionEstimate::new(1.0, 2.0, 0.1)];
        let t = [MotionEstimate::new(10.0, 20.0, 0.5)];
        let s = [MotionEstimate::new(12.0, 19.0, 0.4)];
        let c = compose(&e, &t, &s);
        assert_relative_eq!(c[0].dx, 3.0);
        assert_relative_eq!(c[0].dy, 1.0);
        assert_relative_eq!(c[0].da, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_correction_offsets_land_on_smoothed_path() {
        let e = jittery(40);
        let t = trajectory::build(&e);
        let s = trajectory_smoother::smooth(&t, 5);
        let c = compose(&e, &t, &s);

        for i in 0..e.len() {
            let landed = t[i] + (c[i] - e[i]);
            assert_relative_eq!(landed.dx, s[i].dx, epsilon = 1e-9);
            assert_relative_eq!(landed.dy, s[i].dy, epsilon = 1e-9);
            assert_relative_eq!(landed.da, s[i].da, epsilon = 1e-12);
        }
    }
}
