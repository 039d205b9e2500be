use thiserror::Error;

/// Reasons a frame pair produced no usable motion model.
///
/// These are absorbed by the estimator, which falls back to the identity
/// estimate; they only surface in debug logs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("only {found} point correspondences, need at least {required}")]
    NoCorrespondences { found: usize, required: usize },
    #[error("no consistent partial affine transform among correspondences")]
    TransformFitFailed,
    #[error("frame sizes differ: {prev:?} vs {curr:?}")]
    FrameSizeMismatch { prev: (u32, u32), curr: (u32, u32) },
}
