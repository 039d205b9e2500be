use crate::motion::domain::feature_tracking_config::FeatureTrackingConfig;
use crate::motion::domain::point::Point2;

use super::image_pyramid::{ImagePyramid, PyramidLevel};
use super::sampling::bilinear;

/// Pyramidal Lucas-Kanade sparse optical flow (Bouguet's formulation).
///
/// Each point is tracked coarse to fine: the displacement found at one
/// pyramid level, doubled, seeds the search at the next finer level.
pub struct LucasKanadeTracker {
    window_radius: usize,
    max_iterations: usize,
    epsilon: f64,
    min_eigen_threshold: f64,
}

/// Intensities and gradients of the previous frame sampled over one
/// integration window. Samples that fall outside the image are kept for
/// alignment but flagged invalid and excluded from the solve.
struct Patch {
    intensity: Vec<f64>,
    grad_x: Vec<f64>,
    grad_y: Vec<f64>,
    valid: Vec<bool>,
}

impl LucasKanadeTracker {
    pub fn new(
        window_size: usize,
        max_iterations: usize,
        epsilon: f64,
        min_eigen_threshold: f64,
    ) -> Self {
        Self {
            window_radius: window_size.max(3) / 2,
            max_iterations: max_iterations.max(1),
            epsilon,
            min_eigen_threshold,
        }
    }

    pub fn from_config(config: &FeatureTrackingConfig) -> Self {
        Self::new(
            config.window_size,
            config.max_iterations,
            config.epsilon,
            config.min_eigen_threshold,
        )
    }

    /// Smallest pyramid level side that still fits one integration window.
    pub fn min_level_size(&self) -> usize {
        2 * self.window_radius + 1
    }

    /// Tracks `points` from `prev` into `curr`.
    ///
    /// The result is index-aligned with `points`; `None` marks a point that
    /// was lost (flat texture, non-invertible system, or left the frame).
    pub fn track(
        &self,
        prev: &ImagePyramid,
        curr: &ImagePyramid,
        points: &[Point2],
    ) -> Vec<Option<Point2>> {
        let levels = prev.len().min(curr.len());
        points
            .iter()
            .map(|p| self.track_point(prev, curr, levels, *p))
            .collect()
    }

    fn track_point(
        &self,
        prev: &ImagePyramid,
        curr: &ImagePyramid,
        levels: usize,
        point: Point2,
    ) -> Option<Point2> {
        if levels == 0 {
            return None;
        }

        let mut guess = (0.0f64, 0.0f64);
        for level in (0..levels).rev() {
            let scale = 1.0 / (1u32 << level) as f64;
            let at = Point2::new(point.x * scale, point.y * scale);
            let flow = self.refine(prev.level(level), curr.level(level), at, guess)?;

            guess = if level > 0 {
                (2.0 * (guess.0 + flow.0), 2.0 * (guess.1 + flow.1))
            } else {
                (guess.0 + flow.0, guess.1 + flow.1)
            };
        }

        let tracked = Point2::new(point.x + guess.0, point.y + guess.1);
        if inside(curr.level(0), tracked.x, tracked.y) {
            Some(tracked)
        } else {
            None
        }
    }

    /// Iteratively solves for the residual flow at one level.
    fn refine(
        &self,
        prev: &PyramidLevel,
        curr: &PyramidLevel,
        at: Point2,
        guess: (f64, f64),
    ) -> Option<(f64, f64)> {
        let patch = self.sample_patch(prev, at);

        let (mut gxx, mut gxy, mut gyy) = (0.0, 0.0, 0.0);
        let mut area = 0usize;
        for k in (0..patch.valid.len()).filter(|&k| patch.valid[k]) {
            let (ix, iy) = (patch.grad_x[k], patch.grad_y[k]);
            gxx += ix * ix;
            gxy += ix * iy;
            gyy += iy * iy;
            area += 1;
        }
        if area == 0 {
            return None;
        }
        let area = area as f64;
        let min_eigen =
            ((gxx + gyy) - ((gxx - gyy).powi(2) + 4.0 * gxy * gxy).sqrt()) / (2.0 * area);
        let det = gxx * gyy - gxy * gxy;
        if min_eigen < self.min_eigen_threshold || det.abs() < f64::EPSILON {
            return None;
        }

        let r = self.window_radius as isize;
        let mut flow = (0.0f64, 0.0f64);
        for _ in 0..self.max_iterations {
            let ox = at.x + guess.0 + flow.0;
            let oy = at.y + guess.1 + flow.1;

            let (mut bx, mut by) = (0.0, 0.0);
            let mut k = 0;
            for dy in -r..=r {
                for dx in -r..=r {
                    let (x, y) = (ox + dx as f64, oy + dy as f64);
                    if patch.valid[k] && inside(curr, x, y) {
                        let diff = patch.intensity[k] - bilinear(&curr.image, x, y);
                        bx += diff * patch.grad_x[k];
                        by += diff * patch.grad_y[k];
                    }
                    k += 1;
                }
            }

            let step_x = (gyy * bx - gxy * by) / det;
            let step_y = (gxx * by - gxy * bx) / det;
            flow.0 += step_x;
            flow.1 += step_y;

            if step_x * step_x + step_y * step_y < self.epsilon * self.epsilon {
                break;
            }
        }

        Some(flow)
    }

    fn sample_patch(&self, level: &PyramidLevel, at: Point2) -> Patch {
        let r = self.window_radius as isize;
        let n = (2 * self.window_radius + 1).pow(2);
        let mut patch = Patch {
            intensity: Vec::with_capacity(n),
            grad_x: Vec::with_capacity(n),
            grad_y: Vec::with_capacity(n),
            valid: Vec::with_capacity(n),
        };
        for dy in -r..=r {
            for dx in -r..=r {
                let (x, y) = (at.x + dx as f64, at.y + dy as f64);
                patch.intensity.push(bilinear(&level.image, x, y));
                patch.grad_x.push(bilinear(&level.grad_x, x, y));
                patch.grad_y.push(bilinear(&level.grad_y, x, y));
                patch.valid.push(inside(level, x, y));
            }
        }
        patch
    }
}

fn inside(level: &PyramidLevel, x: f64, y: f64) -> bool {
    x >= 0.0 && y >= 0.0 && x <= (level.width() - 1) as f64 && y <= (level.height() - 1) as f64
}
