/// Tunables for corner detection, sparse optical flow and the robust fit.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureTrackingConfig {
    /// Upper bound on corners detected in the previous frame.
    pub max_corners: usize,
    /// Corners weaker than this fraction of the strongest response are dropped.
    pub quality_level: f64,
    /// Minimum pixel distance between accepted corners.
    pub min_distance: f64,
    /// Side of the square window the corner response is summed over.
    pub block_size: usize,
    /// Side of the square Lucas-Kanade integration window (odd).
    pub window_size: usize,
    /// Number of pyramid levels above full resolution.
    pub max_level: usize,
    pub max_iterations: usize,
    /// Per-iteration update below which tracking is considered converged.
    pub epsilon: f64,
    /// Points whose normalized spatial-gradient matrix has a smaller minimum
    /// eigenvalue are reported lost.
    pub min_eigen_threshold: f64,
    /// Reprojection distance in pixels under which a correspondence is an inlier.
    pub ransac_threshold: f64,
    pub ransac_max_iterations: usize,
    pub ransac_confidence: f64,
}

impl Default for FeatureTrackingConfig {
    fn default() -> Self {
        Self {
            max_corners: 200,
            quality_level: 0.01,
            min_distance: 30.0,
            block_size: 3,
            window_size: 21,
            max_level: 3,
            max_iterations: 30,
            epsilon: 0.01,
            min_eigen_threshold: 1e-3,
            ransac_threshold: 3.0,
            ransac_max_iterations: 2000,
            ransac_confidence: 0.99,
        }
    }
}
