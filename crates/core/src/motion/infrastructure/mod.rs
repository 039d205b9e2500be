pub mod corner_detector;
pub mod image_pyramid;
pub mod lucas_kanade_tracker;
pub mod optical_flow_motion_estimator;
pub mod partial_affine_fit;
mod sampling;
