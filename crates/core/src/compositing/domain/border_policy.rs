/// How a warp fills output pixels whose source position lies outside the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderPolicy {
    /// Repeat the nearest edge pixel.
    #[default]
    Replicate,
    /// Fill with zero (black).
    Black,
}
