use std::fmt;

/// How aggressively the camera path is smoothed.
///
/// Each level maps to the half-width, in frames, of the moving-average window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SmoothingStrength {
    Low,
    #[default]
    Medium,
    High,
}

impl SmoothingStrength {
    pub const ALL: [SmoothingStrength; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn radius(self) -> usize {
        match self {
            Self::Low => 5,
            Self::Medium => 15,
            Self::High => 30,
        }
    }

    /// Parses a user-facing label, case-insensitively.
    ///
    /// Anything unrecognized selects [`SmoothingStrength::Medium`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            other => {
                log::warn!("Unknown stabilization strength {other:?}, using Medium");
                Self::Medium
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for SmoothingStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
