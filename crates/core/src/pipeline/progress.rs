/// Share of the overall percentage given to the estimation pass.
const FIRST_PASS_SHARE: usize = 50;

/// Maps per-pass frame counts onto one monotonically non-decreasing
/// percentage in `0..=100`.
///
/// The first pass covers `0..=50` and the second `50..=100`. Each `*_pass`
/// call returns `Some(percent)` only when the value advanced, so callers can
/// forward it straight to a progress callback.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress after `done` of `total` frames of the estimation pass.
    /// An unknown total (`0`) keeps the value at the start of the pass.
    pub fn first_pass(&mut self, done: usize, total: usize) -> Option<u8> {
        self.advance(scaled(done, total, 0))
    }

    pub fn second_pass(&mut self, done: usize, total: usize) -> Option<u8> {
        let pct = if total == 0 {
            100
        } else {
            scaled(done, total, FIRST_PASS_SHARE)
        };
        self.advance(pct)
    }

    pub fn finish(&mut self) -> Option<u8> {
        self.advance(100)
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    fn advance(&mut self, pct: u8) -> Option<u8> {
        match self.last {
            Some(last) if pct <= last => None,
            _ => {
                self.last = Some(pct);
                Some(pct)
            }
        }
    }
}

fn scaled(done: usize, total: usize, offset: usize) -> u8 {
    if total == 0 {
        return offset as u8;
    }
    let within = done.min(total) * FIRST_PASS_SHARE / total;
    (offset + within).min(100) as u8
}
