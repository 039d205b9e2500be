pub mod affine_transform;
pub mod border_policy;
pub mod frame_compositor;
