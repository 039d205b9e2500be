use image::GrayImage;

use crate::motion::domain::feature_tracking_config::FeatureTrackingConfig;
use crate::motion::domain::fit_error::FitError;
use crate::motion::domain::motion_estimator::MotionEstimator;
use crate::motion::domain::point::Point2;
use crate::shared::motion_estimate::MotionEstimate;

use super::corner_detector::CornerDetector;
use super::image_pyramid::ImagePyramid;
use super::lucas_kanade_tracker::LucasKanadeTracker;
use super::partial_affine_fit::PartialAffineFit;
use super::sampling::to_f32_array;

/// Sparse optical flow estimator: Shi-Tomasi corners in the previous frame,
/// pyramidal Lucas-Kanade tracking into the current frame, then a RANSAC
/// partial affine fit over the surviving correspondences.
///
/// Scale in the fitted model is discarded; only translation and rotation
/// angle are reported.
pub struct OpticalFlowMotionEstimator {
    config: FeatureTrackingConfig,
    detector: CornerDetector,
    tracker: LucasKanadeTracker,
    fitter: PartialAffineFit,
}

impl OpticalFlowMotionEstimator {
    pub fn new(config: FeatureTrackingConfig) -> Self {
        Self {
            detector: CornerDetector::from_config(&config),
            tracker: LucasKanadeTracker::from_config(&config),
            fitter: PartialAffineFit::from_config(&config),
            config,
        }
    }

    /// Like [`MotionEstimator::estimate`] but reports why a pair failed.
    pub fn try_estimate(
        &self,
        prev: &GrayImage,
        curr: &GrayImage,
    ) -> Result<MotionEstimate, FitError> {
        if prev.dimensions() != curr.dimensions() {
            return Err(FitError::FrameSizeMismatch {
                prev: prev.dimensions(),
                curr: curr.dimensions(),
            });
        }

        let prev_arr = to_f32_array(prev);
        let corners = self.detector.detect(&prev_arr);
        if corners.len() < 2 {
            return Err(FitError::NoCorrespondences {
                found: corners.len(),
                required: 2,
            });
        }

        let min_size = self.tracker.min_level_size();
        let prev_pyr = ImagePyramid::build(prev_arr, self.config.max_level, min_size);
        let curr_pyr = ImagePyramid::build(to_f32_array(curr), self.config.max_level, min_size);
        let tracked = self.tracker.track(&prev_pyr, &curr_pyr, &corners);

        let (src, dst): (Vec<Point2>, Vec<Point2>) = corners
            .iter()
            .zip(tracked)
            .filter_map(|(p, t)| t.map(|t| (*p, t)))
            .unzip();

        let (model, _) = self.fitter.fit(&src, &dst)?;
        Ok(MotionEstimate::new(model.tx, model.ty, model.rotation()))
    }
}

impl Default for OpticalFlowMotionEstimator {
    fn default() -> Self {
        Self::new(FeatureTrackingConfig::default())
    }
}

impl MotionEstimator for OpticalFlowMotionEstimator {
    fn estimate(&self, prev: &GrayImage, curr: &GrayImage) -> MotionEstimate {
        match self.try_estimate(prev, curr) {
            Ok(estimate) => estimate,
            Err(e) => {
                log::debug!("Motion estimate fell back to identity: {e}");
                MotionEstimate::IDENTITY
            }
        }
    }
}
