use ndarray::Array2;

use crate::motion::domain::feature_tracking_config::FeatureTrackingConfig;
use crate::motion::domain::point::Point2;

use super::sampling::clamped;

/// Shi-Tomasi "good features to track" detector.
///
/// The corner response is the smaller eigenvalue of the structure tensor
/// summed over a `block_size` window of Sobel gradients. Candidates must
/// reach `quality_level` times the strongest response, be a 3x3 local
/// maximum, and lie at least `min_distance` from every stronger accepted
/// corner.
pub struct CornerDetector {
    max_corners: usize,
    quality_level: f64,
    min_distance: f64,
    block_size: usize,
}

struct Candidate {
    response: f32,
    x: usize,
    y: usize,
}

impl CornerDetector {
    pub fn new(max_corners: usize, quality_level: f64, min_distance: f64, block_size: usize) -> Self {
        Self {
            max_corners,
            quality_level,
            min_distance,
            block_size: block_size.max(1),
        }
    }

    pub fn from_config(config: &FeatureTrackingConfig) -> Self {
        Self::new(
            config.max_corners,
            config.quality_level,
            config.min_distance,
            config.block_size,
        )
    }

    /// Returns corners strongest first.
    pub fn detect(&self, image: &Array2<f32>) -> Vec<Point2> {
        let response = self.min_eigen_response(image);
        let max_response = response.iter().copied().fold(0.0f32, f32::max);
        if max_response <= 0.0 {
            return Vec::new();
        }
        let threshold = (self.quality_level * max_response as f64) as f32;

        let mut candidates = local_maxima(&response, threshold);
        // Strongest first; ties resolved in raster order for stable output
        candidates.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });

        self.enforce_min_distance(&candidates, image.dim())
    }

    fn min_eigen_response(&self, image: &Array2<f32>) -> Array2<f32> {
        let (h, w) = image.dim();
        let mut ixx = Array2::<f32>::zeros((h, w));
        let mut ixy = Array2::<f32>::zeros((h, w));
        let mut iyy = Array2::<f32>::zeros((h, w));

        for y in 0..h as isize {
            for x in 0..w as isize {
                let p = |dx: isize, dy: isize| clamped(image, x + dx, y + dy);
                let gx = (p(1, -1) - p(-1, -1)) + 2.0 * (p(1, 0) - p(-1, 0)) + (p(1, 1) - p(-1, 1));
                let gy = (p(-1, 1) - p(-1, -1)) + 2.0 * (p(0, 1) - p(0, -1)) + (p(1, 1) - p(1, -1));
                let (row, col) = (y as usize, x as usize);
                ixx[[row, col]] = gx * gx;
                ixy[[row, col]] = gx * gy;
                iyy[[row, col]] = gy * gy;
            }
        }

        let half = (self.block_size / 2) as isize;
        let mut response = Array2::<f32>::zeros((h, w));
        // Gradients at the outermost pixels see replicated borders; skip them
        for y in 1..(h as isize - 1) {
            for x in 1..(w as isize - 1) {
                let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);
                for dy in -half..=half {
                    for dx in -half..=half {
                        a += clamped(&ixx, x + dx, y + dy);
                        b += clamped(&ixy, x + dx, y + dy);
                        c += clamped(&iyy, x + dx, y + dy);
                    }
                }
                // lambda_min = det / lambda_max stays exactly 0 on straight edges
                let lambda_max = (a + c) * 0.5 + (((a - c) * 0.5).powi(2) + b * b).sqrt();
                if lambda_max > 0.0 {
                    let det = a * c - b * b;
                    response[[y as usize, x as usize]] = (det / lambda_max).max(0.0);
                }
            }
        }
        response
    }

    fn enforce_min_distance(&self, candidates: &[Candidate], dim: (usize, usize)) -> Vec<Point2> {
        let limit = if self.max_corners == 0 {
            usize::MAX
        } else {
            self.max_corners
        };
        if self.min_distance < 1.0 {
            return candidates
                .iter()
                .take(limit)
                .map(|c| Point2::new(c.x as f64, c.y as f64))
                .collect();
        }

        let cell = self.min_distance;
        let min_dist_sq = self.min_distance * self.min_distance;
        let grid_w = (dim.1 as f64 / cell).ceil() as usize + 1;
        let grid_h = (dim.0 as f64 / cell).ceil() as usize + 1;
        let mut grid: Vec<Vec<Point2>> = vec![Vec::new(); grid_w * grid_h];
        let mut accepted = Vec::new();

        for c in candidates {
            if accepted.len() >= limit {
                break;
            }
            let p = Point2::new(c.x as f64, c.y as f64);
            let gx = (p.x / cell) as usize;
            let gy = (p.y / cell) as usize;

            let too_close = (gy.saturating_sub(1)..=(gy + 1).min(grid_h - 1)).any(|ny| {
                (gx.saturating_sub(1)..=(gx + 1).min(grid_w - 1))
                    .any(|nx| grid[ny * grid_w + nx].iter().any(|q| q.distance_squared(&p) < min_dist_sq))
            });
            if too_close {
                continue;
            }

            grid[gy * grid_w + gx].push(p);
            accepted.push(p);
        }
        accepted
    }
}

/// Pixels at or above `threshold` that no 3x3 neighbour exceeds.
fn local_maxima(response: &Array2<f32>, threshold: f32) -> Vec<Candidate> {
    let (h, w) = response.dim();
    let mut out = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let v = response[[y, x]];
            if v <= 0.0 || v < threshold {
                continue;
            }
            let is_max = (-1..=1isize).all(|dy| {
                (-1..=1isize).all(|dx| clamped(response, x as isize + dx, y as isize + dy) <= v)
            });
            if is_max {
                out.push(Candidate { response: v, x, y });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dark background with bright `size`-pixel squares at the given
    /// top-left corners.
    fn squares(w: usize, h: usize, size: usize, origins: &[(usize, usize)]) -> Array2<f32> {
        Array2::from_shape_fn((h, w), |(y, x)| {
            let inside = origins
                .iter()
                .any(|&(ox, oy)| x >= ox && x < ox + size && y >= oy && y < oy + size);
            if inside {
                220.0
            } else {
                20.0
            }
        })
    }

    fn detector() -> CornerDetector {
        CornerDetector::from_config(&FeatureTrackingConfig::default())
    }

    #[test]
    fn test_flat_image_has_no_corners() {
        let image = Array2::from_elem((64, 64), 128.0);
        assert!(detector().detect(&image).is_empty());
    }

    #[test]
    fn test_straight_edge_has_no_strong_corners() {
        // A single vertical edge: one gradient direction, zero min eigenvalue
        let image = Array2::from_shape_fn((64, 64), |(_, x)| if x < 32 { 0.0 } else { 255.0 });
        assert!(detector().detect(&image).is_empty());
    }

    #[test]
    fn test_square_corners_are_found_near_true_positions() {
        let image = squares(120, 120, 40, &[(40, 40)]);
        let corners = CornerDetector::new(10, 0.01, 10.0, 3).detect(&image);
        assert_eq!(corners.len(), 4);
        let truth = [(40.0, 40.0), (79.0, 40.0), (40.0, 79.0), (79.0, 79.0)];
        for (tx, ty) in truth {
            let hit = corners
                .iter()
                .any(|p| (p.x - tx).abs() <= 2.0 && (p.y - ty).abs() <= 2.0);
            assert!(hit, "no corner near ({tx}, {ty}) in {corners:?}");
        }
    }

    #[test]
    fn test_min_distance_is_respected() {
        let origins: Vec<(usize, usize)> = (0..5)
            .flat_map(|i| (0..5).map(move |j| (10 + i * 22, 10 + j * 22)))
            .collect();
        let image = squares(130, 130, 10, &origins);
        let corners = detector().detect(&image);
        assert!(!corners.is_empty());
        for (i, a) in corners.iter().enumerate() {
            for b in &corners[i + 1..] {
                assert!(a.distance_squared(b) >= 30.0 * 30.0);
            }
        }
    }

    #[test]
    fn test_max_corners_caps_output() {
        let origins: Vec<(usize, usize)> = (0..6)
            .flat_map(|i| (0..6).map(move |j| (8 + i * 20, 8 + j * 20)))
            .collect();
        let image = squares(130, 130, 8, &origins);
        let corners = CornerDetector::new(5, 0.01, 3.0, 3).detect(&image);
        assert_eq!(corners.len(), 5);
    }
}
