pub mod warp_crop_compositor;
