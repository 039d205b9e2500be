use std::fmt;

/// Lifecycle of a single stabilization run.
///
/// Runs move forward only: `Idle` through `WritingOutput`, then exactly one
/// of the terminal states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,
    ReadingFirstFrame,
    EstimatingMotion,
    Smoothing,
    Composing,
    WritingOutput,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ReadingFirstFrame => "reading first frame",
            Self::EstimatingMotion => "estimating motion",
            Self::Smoothing => "smoothing trajectory",
            Self::Composing => "composing frames",
            Self::WritingOutput => "writing output",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
