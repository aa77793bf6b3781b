//! Recursive low-pass smoother used by the calm transform.

/// Three-tap recursive low-pass: `y = a·x + b·y[-1] + c·y[-2]`.
///
/// Feedback runs on the filter's own output so smoothing accumulates.
/// Coefficients are non-negative and sum to 1, which keeps unity DC gain and
/// bounds `|y|` by the largest input magnitude seen so far.
#[derive(Debug, Clone)]
pub struct OutputSmoother {
    b: f32,
    c: f32,
    y1: f32,
    y2: f32,
}

impl OutputSmoother {
    /// `current` weights the new input; the remainder is split between the
    /// two previous outputs according to `recent_share`.
    pub fn new(current: f32, recent_share: f32) -> Self {
        let a = current.clamp(0.05, 1.0);
        let rest = 1.0 - a;
        let share = recent_share.clamp(0.0, 1.0);
        OutputSmoother {
            b: rest * share,
            c: rest * (1.0 - share),
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Set both history taps to `x`, as if `x` had been held forever.
    /// Priming with the first input keeps a constant signal exactly constant.
    pub fn prime(&mut self, x: f32) {
        self.y1 = x;
        self.y2 = x;
    }

    // Written as `x + b·(y1 - x) + c·(y2 - x)`, equal to
    // `a·x + b·y1 + c·y2` because a + b + c = 1, but exact when y1 = y2 = x.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = x + self.b * (self.y1 - x) + self.c * (self.y2 - x);
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    pub fn process_block(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&x| self.process(x)).collect()
    }

}

impl Default for OutputSmoother {
    fn default() -> Self {
        // 0.4 / 0.35 / 0.25
        OutputSmoother::new(0.4, 0.35 / 0.6)
    }
}
