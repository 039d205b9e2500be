pub mod compositing;
pub mod motion;
pub mod pipeline;
pub mod shared;
pub mod trajectory;
pub mod video;
