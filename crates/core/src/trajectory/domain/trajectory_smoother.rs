use crate::shared::motion_estimate::MotionEstimate;

/// Domain interface for low-pass filtering a camera trajectory.
pub trait TrajectorySmoother: Send {
    /// Same-length smoothed copy of `trajectory`.
    fn smooth(&self, trajectory: &[MotionEstimate], radius: usize) -> Vec<MotionEstimate>;
}

/// Centered moving average over `2 * radius + 1` samples.
///
/// Sequences are padded by repeating their first and last samples, so the
/// path does not sag toward zero at the clip boundaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovingAverageSmoother;

impl TrajectorySmoother for MovingAverageSmoother {
    fn smooth(&self, trajectory: &[MotionEstimate], radius: usize) -> Vec<MotionEstimate> {
        smooth(trajectory, radius)
    }
}

pub fn smooth(trajectory: &[MotionEstimate], radius: usize) -> Vec<MotionEstimate> {
    if radius == 0 || trajectory.is_empty() {
        return trajectory.to_vec();
    }

    let mut channels = [Vec::new(), Vec::new(), Vec::new()];
    for (axis, channel) in channels.iter_mut().enumerate() {
        let series: Vec<f64> = trajectory.iter().map(|t| t.components()[axis]).collect();
        *channel = moving_average(&series, radius);
    }

    (0..trajectory.len())
        .map(|i| MotionEstimate::from_components([channels[0][i], channels[1][i], channels[2][i]]))
        .collect()
}

/// Edge-padded box filter, evaluated with a running sum.
fn moving_average(series: &[f64], radius: usize) -> Vec<f64> {
    let n = series.len();
    let width = 2 * radius + 1;
    let at = |i: isize| series[i.clamp(0, n as isize - 1) as usize];

    let r = radius as isize;
    let mut sum: f64 = (-r..=r).map(at).sum();
    let mut out = Vec::with_capacity(n);
    for i in 0..n as isize {
        out.push(sum / width as f64);
        sum += at(i + r + 1) - at(i - r);
    }
    out
}
