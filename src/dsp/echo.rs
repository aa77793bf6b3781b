//! Tap-delay echo.
//!
//! Unlike a running delay line, the whole source channel is available up
//! front, so each tap reads straight from the source at `i - offset`.

/// One echo tap: delay in seconds and linear gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoTap {
    pub delay: f64,
    pub gain: f32,
}

/// A multi-tap echo. Taps whose delay rounds to zero samples are ignored.
#[derive(Debug, Clone)]
pub struct TapEcho {
    taps: Vec<(usize, f32)>,
}

impl TapEcho {
    pub fn new(sample_rate: u32, taps: &[EchoTap]) -> Self {
        let taps = taps
            .iter()
            .filter_map(|t| {
                let offset = (t.delay * sample_rate as f64).round() as usize;
                (offset > 0).then_some((offset, t.gain))
            })
            .collect();
        TapEcho { taps }
    }

    /// Evenly spaced taps with geometrically decaying gain:
    /// `spacing, 2·spacing, ...` at `gain, gain·decay, ...`.
    pub fn decaying(sample_rate: u32, spacing: f64, count: usize, gain: f32, decay: f32) -> Self {
        let taps: Vec<EchoTap> = (0..count)
            .map(|k| EchoTap {
                delay: spacing * (k + 1) as f64,
                gain: gain * decay.powi(k as i32),
            })
            .collect();
        TapEcho::new(sample_rate, &taps)
    }

    /// Sum of the echo contributions for sample `i` of `source`. Taps are
    /// silent until `i` reaches their offset.
    #[inline]
    pub fn wet(&self, source: &[f32], i: usize) -> f32 {
        self.taps
            .iter()
            .filter(|(offset, _)| i >= *offset)
            .filter_map(|(offset, gain)| source.get(i - offset).map(|&s| s * gain))
            .sum()
    }

    /// Like [`TapEcho::wet`], but reads before the start of `source` hold
    /// its first sample. A constant input then yields a constant echo, and
    /// each tap's sample-to-sample changes are a delayed copy of the source's.
    #[inline]
    pub fn wet_held(&self, source: &[f32], i: usize) -> f32 {
        self.taps
            .iter()
            .filter_map(|(offset, gain)| source.get(i.saturating_sub(*offset)).map(|&s| s * gain))
            .sum()
    }

    /// Sum of absolute tap gains.
    pub fn total_gain(&self) -> f32 {
        self.taps.iter().map(|(_, g)| g.abs()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_appears_at_each_tap() {
        let echo = TapEcho::decaying(10, 0.2, 3, 0.5, 0.5);
        assert!((echo.total_gain() - 0.875).abs() < 1e-6);

        let mut src = vec![0.0; 10];
        src[0] = 1.0;
        let wet: Vec<f32> = (0..10).map(|i| echo.wet(&src, i)).collect();
        assert_eq!(wet[2], 0.5);
        assert_eq!(wet[4], 0.25);
        assert_eq!(wet[6], 0.125);
        assert_eq!(wet[1] + wet[3] + wet[5] + wet[7], 0.0);
    }

    #[test]
    fn no_echo_before_first_offset() {
        let echo = TapEcho::new(100, &[EchoTap { delay: 0.35, gain: 0.3 }]);
        let src = vec![1.0; 50];
        for i in 0..35 {
            assert_eq!(echo.wet(&src, i), 0.0);
        }
        assert!((echo.wet(&src, 35) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn sub_sample_taps_dropped() {
        let echo = TapEcho::new(2, &[EchoTap { delay: 0.1, gain: 1.0 }]);
        assert_eq!(echo.total_gain(), 0.0);
        assert_eq!(echo.wet(&[1.0, 1.0], 1), 0.0);
    }

    #[test]
    fn held_echo_repeats_first_sample_before_start() {
        let echo = TapEcho::decaying(10, 0.2, 2, 0.5, 0.5);
        let src = [0.4, 0.8, 0.8, 0.8, 0.8];
        // offsets 2 and 4 both read src[0] at i = 0
        assert!((echo.wet_held(&src, 0) - 0.4 * 0.75).abs() < 1e-6);
        assert!((echo.wet_held(&src, 3) - (0.8 * 0.5 + 0.4 * 0.25)).abs() < 1e-6);
        let dc = [0.3f32; 20];
        let first = echo.wet_held(&dc, 0);
        assert!((0..20).all(|i| echo.wet_held(&dc, i) == first));
    }
}
