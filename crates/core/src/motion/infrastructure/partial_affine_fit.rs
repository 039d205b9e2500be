use crate::motion::domain::feature_tracking_config::FeatureTrackingConfig;
use crate::motion::domain::fit_error::FitError;
use crate::motion::domain::point::Point2;

/// Two correspondences determine a similarity transform.
const MIN_SAMPLE: usize = 2;

/// 4-DOF partial affine (similarity) transform:
///
/// ```text
/// x' = a*x - b*y + tx
/// y' = b*x + a*y + ty
/// ```
///
/// with `a = s*cos(theta)` and `b = s*sin(theta)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Similarity {
    pub a: f64,
    pub b: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Similarity {
    pub fn apply(&self, p: &Point2) -> Point2 {
        Point2::new(
            self.a * p.x - self.b * p.y + self.tx,
            self.b * p.x + self.a * p.y + self.ty,
        )
    }

    pub fn rotation(&self) -> f64 {
        self.b.atan2(self.a)
    }

    pub fn scale(&self) -> f64 {
        self.a.hypot(self.b)
    }
}

/// RANSAC estimator for [`Similarity`] between point correspondences.
///
/// Minimal two-point samples are scored by counting correspondences within
/// `threshold` pixels; the iteration budget shrinks as the inlier ratio of
/// the best model grows. The winning consensus set is refit by least squares.
pub struct PartialAffineFit {
    threshold: f64,
    max_iterations: usize,
    confidence: f64,
}

impl PartialAffineFit {
    pub fn new(threshold: f64, max_iterations: usize, confidence: f64) -> Self {
        Self {
            threshold,
            max_iterations: max_iterations.max(1),
            confidence: confidence.clamp(0.0, 0.9999),
        }
    }

    pub fn from_config(config: &FeatureTrackingConfig) -> Self {
        Self::new(
            config.ransac_threshold,
            config.ransac_max_iterations,
            config.ransac_confidence,
        )
    }

    /// Fits `dst ~ T(src)`. Returns the transform and the inlier mask.
    pub fn fit(&self, src: &[Point2], dst: &[Point2]) -> Result<(Similarity, Vec<bool>), FitError> {
        let n = src.len().min(dst.len());
        if n < MIN_SAMPLE {
            return Err(FitError::NoCorrespondences {
                found: n,
                required: MIN_SAMPLE,
            });
        }

        let threshold_sq = self.threshold * self.threshold;
        let mut best: Option<Similarity> = None;
        let mut best_inliers = vec![false; n];
        let mut best_count = 0usize;
        let mut budget = self.max_iterations;

        let mut i = 0;
        while i < budget {
            let idx = sample_unique_indices(n, MIN_SAMPLE, i as u64 + 1);
            i += 1;

            let Some(model) = least_squares(src, dst, &idx) else {
                continue;
            };

            let mask: Vec<bool> = (0..n)
                .map(|j| model.apply(&src[j]).distance_squared(&dst[j]) <= threshold_sq)
                .collect();
            let count = mask.iter().filter(|&&m| m).count();

            if count > best_count {
                best_count = count;
                best_inliers = mask;
                best = Some(model);
                budget = budget.min(self.required_iterations(count, n));
            }
        }

        let best = best.ok_or(FitError::TransformFitFailed)?;
        if best_count < MIN_SAMPLE {
            return Err(FitError::TransformFitFailed);
        }

        let inlier_idx: Vec<usize> = (0..n).filter(|&j| best_inliers[j]).collect();
        let refined = least_squares(src, dst, &inlier_idx).unwrap_or(best);

        log::trace!(
            "Partial affine fit: {best_count}/{n} inliers after {i} iterations, scale {:.4}",
            refined.scale()
        );

        Ok((refined, best_inliers))
    }

    /// Iterations needed to draw one all-inlier sample with `confidence`,
    /// given the current inlier ratio.
    fn required_iterations(&self, inliers: usize, n: usize) -> usize {
        let ratio = inliers as f64 / n as f64;
        let p_good_sample = ratio.powi(MIN_SAMPLE as i32);
        if p_good_sample >= 1.0 {
            return 1;
        }
        if p_good_sample <= 0.0 {
            return self.max_iterations;
        }
        let needed = (1.0 - self.confidence).ln() / (1.0 - p_good_sample).ln();
        if needed.is_finite() {
            (needed.ceil() as usize).max(1)
        } else {
            self.max_iterations
        }
    }
}

/// Closed-form least-squares similarity over the selected correspondences.
///
/// Returns `None` when the source points are coincident.
fn least_squares(src: &[Point2], dst: &[Point2], idx: &[usize]) -> Option<Similarity> {
    if idx.len() < MIN_SAMPLE {
        return None;
    }
    let k = idx.len() as f64;
    let (mut sx, mut sy, mut dx, mut dy) = (0.0, 0.0, 0.0, 0.0);
    for &j in idx {
        sx += src[j].x;
        sy += src[j].y;
        dx += dst[j].x;
        dy += dst[j].y;
    }
    let (sx, sy, dx, dy) = (sx / k, sy / k, dx / k, dy / k);

    let (mut norm, mut dot, mut cross) = (0.0, 0.0, 0.0);
    for &j in idx {
        let (px, py) = (src[j].x - sx, src[j].y - sy);
        let (qx, qy) = (dst[j].x - dx, dst[j].y - dy);
        norm += px * px + py * py;
        dot += px * qx + py * qy;
        cross += px * qy - py * qx;
    }
    if norm < 1e-9 {
        return None;
    }

    let a = dot / norm;
    let b = cross / norm;
    Some(Similarity {
        a,
        b,
        tx: dx - (a * sx - b * sy),
        ty: dy - (b * sx + a * sy),
    })
}

/// Deterministic draw of `k` distinct indices below `n` (requires `k <= n`).
fn sample_unique_indices(n: usize, k: usize, seed: u64) -> Vec<usize> {
    let mut out = Vec::with_capacity(k);
    let mut used = vec![false; n];
    let mut state = seed ^ 0x9E3779B97F4A7C15;
    while out.len() < k {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let idx = ((state >> 33) as usize) % n;
        if !used[idx] {
            used[idx] = true;
            out.push(idx);
        }
    }
    out
}
