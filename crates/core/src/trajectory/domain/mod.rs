pub mod correction_composer;
pub mod smoothing_strength;
pub mod trajectory;
pub mod trajectory_smoother;
