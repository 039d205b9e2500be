use image::GrayImage;
use ndarray::Array2;

/// Copies an 8-bit grayscale image into a `[height, width]` float array.
pub fn to_f32_array(image: &GrayImage) -> Array2<f32> {
    let (w, h) = image.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        image.get_pixel(x as u32, y as u32).0[0] as f32
    })
}

/// Reads `img[y, x]` with coordinates clamped to the image (edge replicate).
#[inline]
pub fn clamped(img: &Array2<f32>, x: isize, y: isize) -> f32 {
    let (h, w) = img.dim();
    let cx = x.max(0).min(w as isize - 1) as usize;
    let cy = y.max(0).min(h as isize - 1) as usize;
    img[[cy, cx]]
}

/// Bilinear interpolation at a sub-pixel position, edge-replicated outside.
#[inline]
pub fn bilinear(img: &Array2<f32>, x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as isize, y0 as isize);

    let p00 = clamped(img, x0, y0) as f64;
    let p10 = clamped(img, x0 + 1, y0) as f64;
    let p01 = clamped(img, x0, y0 + 1) as f64;
    let p11 = clamped(img, x0 + 1, y0 + 1) as f64;

    let top = p00 + (p10 - p00) * fx;
    let bottom = p01 + (p11 - p01) * fx;
    top + (bottom - top) * fy
}
