use thiserror::Error;

/// Terminal failure of a stabilization run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StabilizeError {
    #[error("cannot read source video: {0}")]
    SourceUnreadable(String),
    #[error("no frame could be composited, output file not created")]
    NoOutputProduced,
    #[error("unexpected fault during stabilization: {0}")]
    UnexpectedFault(String),
    #[error("stabilization cancelled")]
    Cancelled,
}

impl StabilizeError {
    pub(crate) fn fault(e: impl std::fmt::Display) -> Self {
        Self::UnexpectedFault(e.to_string())
    }
}
