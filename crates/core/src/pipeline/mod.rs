pub mod infrastructure;
pub mod pipeline_logger;
pub mod pipeline_state;
pub mod progress;
pub mod stabilization_config;
pub mod stabilization_report;
pub mod stabilize_error;
pub mod stabilize_video_use_case;
