use crate::trajectory::domain::smoothing_strength::SmoothingStrength;

/// User-facing options of a stabilization run.
///
/// The crop margin is a property of the compositor, not of the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StabilizationConfig {
    pub strength: SmoothingStrength,
}

impl StabilizationConfig {
    pub fn with_strength(strength: SmoothingStrength) -> Self {
        Self { strength }
    }

    /// Moving-average half-width selected by `strength`.
    pub fn smoothing_radius(&self) -> usize {
        self.strength.radius()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_medium() {
        let config = StabilizationConfig::default();
        assert_eq!(config.strength, SmoothingStrength::Medium);
        assert_eq!(config.smoothing_radius(), 15);
    }

    #[test]
    fn test_with_strength_selects_radius() {
        let config = StabilizationConfig::with_strength(SmoothingStrength::High);
        assert_eq!(config.smoothing_radius(), 30);
    }
}
