use ndarray::Array2;

use super::sampling::clamped;

/// Binomial approximation of a Gaussian used before each 2x decimation.
const DOWNSAMPLE_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// One resolution of a Gaussian pyramid together with its spatial gradients.
pub struct PyramidLevel {
    pub image: Array2<f32>,
    pub grad_x: Array2<f32>,
    pub grad_y: Array2<f32>,
}

impl PyramidLevel {
    fn new(image: Array2<f32>) -> Self {
        let (grad_x, grad_y) = scharr_gradients(&image);
        Self {
            image,
            grad_x,
            grad_y,
        }
    }

    pub fn width(&self) -> usize {
        self.image.dim().1
    }

    pub fn height(&self) -> usize {
        self.image.dim().0
    }
}

/// Gaussian image pyramid: level 0 is full resolution, each further level
/// halves both dimensions.
pub struct ImagePyramid {
    levels: Vec<PyramidLevel>,
}

impl ImagePyramid {
    /// Builds up to `max_level + 1` levels, stopping early once a level would
    /// be smaller than `min_size` in either dimension.
    pub fn build(base: Array2<f32>, max_level: usize, min_size: usize) -> Self {
        let mut levels = vec![PyramidLevel::new(base)];
        while levels.len() <= max_level {
            let prev = &levels[levels.len() - 1].image;
            let (h, w) = prev.dim();
            let (nh, nw) = (h.div_ceil(2), w.div_ceil(2));
            if nh < min_size || nw < min_size {
                break;
            }
            let next = downsample(prev);
            levels.push(PyramidLevel::new(next));
        }
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, index: usize) -> &PyramidLevel {
        &self.levels[index]
    }
}

/// Separable 5-tap blur followed by dropping every other row and column.
fn downsample(src: &Array2<f32>) -> Array2<f32> {
    let (h, w) = src.dim();
    let half = (DOWNSAMPLE_KERNEL.len() / 2) as isize;

    // Horizontal pass only at the columns that survive decimation
    let nw = w.div_ceil(2);
    let mut temp = Array2::<f32>::zeros((h, nw));
    for y in 0..h {
        for nx in 0..nw {
            let cx = (nx * 2) as isize;
            let mut sum = 0.0f32;
            for (k, &weight) in DOWNSAMPLE_KERNEL.iter().enumerate() {
                sum += clamped(src, cx + k as isize - half, y as isize) * weight;
            }
            temp[[y, nx]] = sum;
        }
    }

    let nh = h.div_ceil(2);
    let mut out = Array2::<f32>::zeros((nh, nw));
    for ny in 0..nh {
        let cy = (ny * 2) as isize;
        for x in 0..nw {
            let mut sum = 0.0f32;
            for (k, &weight) in DOWNSAMPLE_KERNEL.iter().enumerate() {
                sum += clamped(&temp, x as isize, cy + k as isize - half) * weight;
            }
            out[[ny, x]] = sum;
        }
    }
    out
}

/// Scharr derivatives scaled by 1/32, i.e. intensity change per pixel.
fn scharr_gradients(img: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = img.dim();
    let mut gx = Array2::<f32>::zeros((h, w));
    let mut gy = Array2::<f32>::zeros((h, w));

    for y in 0..h as isize {
        for x in 0..w as isize {
            let p = |dx: isize, dy: isize| clamped(img, x + dx, y + dy);
            let dx = 3.0 * (p(1, -1) - p(-1, -1))
                + 10.0 * (p(1, 0) - p(-1, 0))
                + 3.0 * (p(1, 1) - p(-1, 1));
            let dy = 3.0 * (p(-1, 1) - p(-1, -1))
                + 10.0 * (p(0, 1) - p(0, -1))
                + 3.0 * (p(1, 1) - p(1, -1));
            gx[[y as usize, x as usize]] = dx / 32.0;
            gy[[y as usize, x as usize]] = dy / 32.0;
        }
    }
    (gx, gy)
}
