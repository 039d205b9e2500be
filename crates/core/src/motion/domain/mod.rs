pub mod feature_tracking_config;
pub mod fit_error;
pub mod motion_estimator;
pub mod point;
