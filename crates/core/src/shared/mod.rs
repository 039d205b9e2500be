pub mod constants;
pub mod frame;
pub mod motion_estimate;
pub mod video_metadata;
