use ndarray::ArrayView3;

use crate::compositing::domain::affine_transform::AffineTransform;
use crate::compositing::domain::border_policy::BorderPolicy;
use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::shared::constants::CROP_RATIO;
use crate::shared::frame::Frame;
use crate::shared::motion_estimate::CorrectiveTransform;

/// CPU compositor: bilinear affine warp followed by a fixed border crop.
///
/// Every output pixel `p` samples the source at `M^-1 * p`, where `M` is the
/// corrective transform. Only pixels inside the crop window are computed,
/// which yields the same result as warping the full frame and cropping.
pub struct WarpCropCompositor {
    crop_ratio: f64,
    border: BorderPolicy,
}

impl WarpCropCompositor {
    pub fn new(crop_ratio: f64, border: BorderPolicy) -> Self {
        Self {
            crop_ratio: crop_ratio.clamp(0.0, 0.5),
            border,
        }
    }

    /// Crop window `(x, y, width, height)` for a `width x height` frame.
    ///
    /// `None` when nothing would remain. A positive ratio whose margin floors
    /// to zero on either axis (under 20 px at the default 5%) also yields
    /// `None`: such a frame is dropped rather than passed through uncropped,
    /// so the warped border is never shown.
    pub fn crop_window(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let mx = (self.crop_ratio * width as f64).floor() as u32;
        let my = (self.crop_ratio * height as f64).floor() as u32;
        if self.crop_ratio > 0.0 && (mx == 0 || my == 0) {
            return None;
        }
        let w = width.checked_sub(2 * mx)?;
        let h = height.checked_sub(2 * my)?;
        if w == 0 || h == 0 {
            return None;
        }
        Some((mx, my, w, h))
    }
}

impl Default for WarpCropCompositor {
    fn default() -> Self {
        Self::new(CROP_RATIO, BorderPolicy::default())
    }
}

impl FrameCompositor for WarpCropCompositor {
    fn composite(&self, frame: Frame, transform: &CorrectiveTransform) -> Option<Frame> {
        let (x0, y0, w, h) = self.crop_window(frame.width(), frame.height())?;
        let inverse = AffineTransform::from_correction(transform).inverse()?;

        let channels = frame.channels() as usize;
        let src = frame.as_ndarray();
        let mut data = Vec::with_capacity(w as usize * h as usize * channels);
        let mut pixel = vec![0.0f64; channels];

        for oy in 0..h {
            for ox in 0..w {
                let (sx, sy) = inverse.apply((x0 + ox) as f64, (y0 + oy) as f64);
                if !sx.is_finite() || !sy.is_finite() {
                    return None;
                }
                sample(&src, sx, sy, self.border, &mut pixel);
                data.extend(pixel.iter().map(|v| v.round().clamp(0.0, 255.0) as u8));
            }
        }

        Some(Frame::new(data, w, h, frame.channels(), frame.index()))
    }
}

/// Bilinear sample of every channel at `(x, y)`.
fn sample(src: &ArrayView3<u8>, x: f64, y: f64, border: BorderPolicy, out: &mut [f64]) {
    let (h, w, _) = src.dim();
    let (xf, yf) = (x.floor(), y.floor());
    let (fx, fy) = (x - xf, y - yf);
    let (xi, yi) = (xf as isize, yf as isize);

    let fetch = |px: isize, py: isize, c: usize| -> f64 {
        match border {
            BorderPolicy::Replicate => {
                let cx = px.clamp(0, w as isize - 1) as usize;
                let cy = py.clamp(0, h as isize - 1) as usize;
                src[[cy, cx, c]] as f64
            }
            BorderPolicy::Black => {
                if px < 0 || py < 0 || px >= w as isize || py >= h as isize {
                    0.0
                } else {
                    src[[py as usize, px as usize, c]] as f64
                }
            }
        }
    };

    for (c, v) in out.iter_mut().enumerate() {
        let top = fetch(xi, yi, c) * (1.0 - fx) + fetch(xi + 1, yi, c) * fx;
        let bottom = fetch(xi, yi + 1, c) * (1.0 - fx) + fetch(xi + 1, yi + 1, c) * fx;
        *v = top * (1.0 - fy) + bottom * fy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// RGB frame whose red channel encodes x and green encodes y.
    fn coordinate_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 200]);
            }
        }
        Frame::new(data, width, height, 3, 7)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        let d = frame.data();
        [d[i], d[i + 1], d[i + 2]]
    }

    #[rstest]
    #[case(100, 100, 90, 90)]
    #[case(100, 80, 90, 72)]
    #[case(640, 360, 576, 324)]
    #[case(25, 21, 23, 19)]
    fn test_output_dimensions(
        #[case] w: u32,
        #[case] h: u32,
        #[case] out_w: u32,
        #[case] out_h: u32,
    ) {
        let out = WarpCropCompositor::default()
            .composite(coordinate_frame(w, h), &CorrectiveTransform::new(1.5, -2.0, 0.01))
            .unwrap();
        assert_eq!((out.width(), out.height()), (out_w, out_h));
        assert_eq!(out.data().len(), (out_w * out_h * 3) as usize);
    }

    #[rstest]
    #[case::smallest_cropped(20, 20, Some((1, 1, 18, 18)))]
    #[case::narrow(19, 40, None)]
    #[case::short(40, 19, None)]
    fn test_crop_window_margin_threshold(
        #[case] w: u32,
        #[case] h: u32,
        #[case] expected: Option<(u32, u32, u32, u32)>,
    ) {
        assert_eq!(WarpCropCompositor::default().crop_window(w, h), expected);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(10, 10)]
    #[case(200, 12)]
    fn test_too_small_frames_are_dropped(#[case] w: u32, #[case] h: u32) {
        let out = WarpCropCompositor::default()
            .composite(coordinate_frame(w, h), &CorrectiveTransform::IDENTITY);
        assert!(out.is_none());
    }

    #[test]
    fn test_identity_equals_plain_crop() {
        let frame = coordinate_frame(100, 60);
        let expected = frame.crop(5, 3, 90, 54).unwrap();
        let out = WarpCropCompositor::default()
            .composite(frame, &CorrectiveTransform::IDENTITY)
            .unwrap();
        assert_eq!(out.data(), expected.data());
        assert_eq!(out.index(), 7);
    }

    #[test]
    fn test_translation_shifts_content() {
        let frame = coordinate_frame(100, 100);
        let out = WarpCropCompositor::default()
            .composite(frame, &CorrectiveTransform::new(3.0, -2.0, 0.0))
            .unwrap();
        // Output (0, 0) is full-frame (5, 5), sampled from source (2, 7)
        assert_eq!(pixel(&out, 0, 0), [2, 7, 200]);
        assert_eq!(pixel(&out, 40, 10), [42, 17, 200]);
    }

    #[test]
    fn test_half_pixel_translation_interpolates() {
        let frame = coordinate_frame(100, 100);
        let out = WarpCropCompositor::default()
            .composite(frame, &CorrectiveTransform::new(0.5, 0.0, 0.0))
            .unwrap();
        // Source x = 4.5 blends 4 and 5 and rounds half away from zero
        assert_eq!(pixel(&out, 0, 0), [5, 5, 200]);
    }

    #[test]
    fn test_border_policies_fill_differently() {
        let shift = CorrectiveTransform::new(30.0, 0.0, 0.0);

        let black = WarpCropCompositor::new(CROP_RATIO, BorderPolicy::Black)
            .composite(coordinate_frame(100, 100), &shift)
            .unwrap();
        assert_eq!(pixel(&black, 0, 10), [0, 0, 0]);
        assert_eq!(pixel(&black, 50, 10), [25, 15, 200]);

        let replicate = WarpCropCompositor::default()
            .composite(coordinate_frame(100, 100), &shift)
            .unwrap();
        assert_eq!(pixel(&replicate, 0, 10), [0, 15, 200]);
        assert_eq!(pixel(&replicate, 50, 10), [25, 15, 200]);
    }

    #[test]
    fn test_rotation_about_origin_still_fills_frame() {
        let out = WarpCropCompositor::default()
            .composite(coordinate_frame(80, 80), &CorrectiveTransform::new(0.0, 0.0, 0.5))
            .unwrap();
        assert_eq!((out.width(), out.height()), (72, 72));
        // Origin is the fixed point of the rotation
        let top_left = pixel(&out, 0, 0);
        assert!(top_left[0] <= 8 && top_left[1] <= 8);
    }

    #[test]
    fn test_non_finite_transform_is_dropped() {
        let out = WarpCropCompositor::default()
            .composite(coordinate_frame(40, 40), &CorrectiveTransform::new(f64::NAN, 0.0, 0.0));
        assert!(out.is_none());
    }

    #[test]
    fn test_zero_ratio_keeps_full_frame() {
        let frame = coordinate_frame(8, 8);
        let out = WarpCropCompositor::new(0.0, BorderPolicy::Replicate)
            .composite(frame.clone(), &CorrectiveTransform::IDENTITY)
            .unwrap();
        assert_eq!(out.data(), frame.data());
    }
}
