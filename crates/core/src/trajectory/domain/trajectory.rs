use crate::shared::motion_estimate::MotionEstimate;

/// Cumulative camera path: element `i` is the sum of estimates `0..=i`.
pub fn build(estimates: &[MotionEstimate]) -> Vec<MotionEstimate> {
    estimates
        .iter()
        .scan(MotionEstimate::IDENTITY, |acc, e| {
            *acc = *acc + *e;
            Some(*acc)
        })
        .collect()
}
