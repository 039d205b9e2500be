use ndarray::{s, ArrayView3};

/// A single decoded video frame: contiguous RGB bytes in row-major order.
///
/// Frames are never mutated once built. Stages that change pixels (the
/// compositor) produce a new `Frame` and hand the old one back to the
/// allocator.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Single-channel luma view used for motion estimation.
    ///
    /// Three-channel frames go through `image`'s Rec. 709 luma conversion;
    /// single-channel frames are copied as-is.
    pub fn to_grayscale(&self) -> image::GrayImage {
        match self.channels {
            1 => image::GrayImage::from_raw(self.width, self.height, self.data.clone())
                .unwrap_or_else(|| image::GrayImage::new(self.width, self.height)),
            3 => match image::RgbImage::from_raw(self.width, self.height, self.data.clone()) {
                Some(rgb) => image::imageops::grayscale(&rgb),
                None => image::GrayImage::new(self.width, self.height),
            },
            _ => {
                let c = self.channels as usize;
                let luma = self.data.chunks_exact(c).map(|px| px[0]).collect();
                image::GrayImage::from_raw(self.width, self.height, luma)
                    .unwrap_or_else(|| image::GrayImage::new(self.width, self.height))
            }
        }
    }

    /// Copies the `width x height` window starting at `(x, y)` into a new frame.
    ///
    /// Returns `None` when the window is empty or falls outside the frame.
    #[cfg(test)]
    pub(crate) fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Frame> {
        if width == 0 || height == 0 {
            return None;
        }
        if x.checked_add(width)? > self.width || y.checked_add(height)? > self.height {
            return None;
        }

        let (x, y) = (x as usize, y as usize);
        let (w, h) = (width as usize, height as usize);
        let window = self.as_ndarray();
        let window = window.slice(s![y..y + h, x..x + w, ..]);
        let data: Vec<u8> = window.iter().copied().collect();

        Some(Frame::new(data, width, height, self.channels, self.index))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = (y * width + x) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 24]; // 2x4x3
        let frame = Frame::new(data, 4, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_grayscale_of_gray_rgb_keeps_intensity() {
        let frame = gradient_frame(4, 4);
        let gray = frame.to_grayscale();
        assert_eq!(gray.dimensions(), (4, 4));
        assert_eq!(gray.get_pixel(3, 2).0[0], 11);
    }

    #[test]
    fn test_grayscale_weights_green_highest() {
        let red = Frame::new(vec![255, 0, 0], 1, 1, 3, 0).to_grayscale();
        let green = Frame::new(vec![0, 255, 0], 1, 1, 3, 0).to_grayscale();
        assert!(green.get_pixel(0, 0).0[0] > red.get_pixel(0, 0).0[0]);
    }

    #[test]
    fn test_crop_copies_window() {
        let frame = gradient_frame(4, 4);
        let cropped = frame.crop(1, 1, 2, 2).unwrap();
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
        let firsts: Vec<u8> = cropped.data().chunks(3).map(|px| px[0]).collect();
        assert_eq!(firsts, vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_keeps_index() {
        let frame = Frame::new(vec![0; 27], 3, 3, 3, 7);
        assert_eq!(frame.crop(0, 0, 1, 1).unwrap().index(), 7);
    }

    #[test]
    fn test_crop_empty_or_out_of_bounds_is_none() {
        let frame = gradient_frame(4, 4);
        assert!(frame.crop(0, 0, 0, 2).is_none());
        assert!(frame.crop(3, 3, 2, 2).is_none());
    }
}
